//! Per-request database transaction middleware.
//!
//! Wrapping a scope in [`Transaction`] gives every request under it one
//! dedicated pooled connection with an open READ COMMITTED transaction.
//! Handlers receive the handle through the [`TransactionScope`] extractor,
//! so the flow of the transaction through the request is visible in every
//! signature it crosses.
//!
//! The transaction commits after the handler returns, whatever the response
//! status: error responses carry no uncommitted writes because failed
//! operations return before writing. A commit or begin failure turns the
//! response into an internal error.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use diesel_async::{AnsiTransactionManager, RunQueryDsl, TransactionManager};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use tracing::error;

use crate::api::ApiError;
use crate::domain::Error as DomainError;
use crate::outbound::persistence::{DbPool, OwnedPgConnection};

/// Cloneable handle to the request's open transaction.
///
/// Stored in request extensions by the middleware and recovered in handlers
/// via its [`FromRequest`] impl. The mutex is uncontended in practice; a
/// request drives its database calls sequentially.
#[derive(Clone)]
pub struct TransactionScope {
    conn: Arc<Mutex<OwnedPgConnection>>,
}

impl TransactionScope {
    fn new(conn: OwnedPgConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Borrow the underlying connection for a statement.
    pub async fn lock(&self) -> MutexGuard<'_, OwnedPgConnection> {
        self.conn.lock().await
    }

    async fn lock_owned(&self) -> OwnedMutexGuard<OwnedPgConnection> {
        Arc::clone(&self.conn).lock_owned().await
    }
}

impl FromRequest for TransactionScope {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let scope = req.extensions().get::<TransactionScope>().cloned();
        ready(scope.ok_or_else(|| {
            // Reaching here means a handler took the extractor without the
            // middleware wrapping its scope.
            error!(path = %req.path(), "no transaction scope on request");
            ApiError::from(DomainError::internal()).into()
        }))
    }
}

async fn begin_read_committed(conn: &mut OwnedPgConnection) -> Result<(), diesel::result::Error> {
    AnsiTransactionManager::begin_transaction(&mut **conn).await?;
    diesel::sql_query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
        .execute(&mut **conn)
        .await?;
    Ok(())
}

/// Best-effort rollback before a connection goes back to the pool.
///
/// A connection returned with a transaction still open would nest a
/// savepoint on its next checkout. Rolling back after a failed begin is a
/// no-op error and only logged.
async fn rollback_quietly(conn: &mut OwnedPgConnection) {
    if let Err(err) = AnsiTransactionManager::rollback_transaction(&mut **conn).await {
        tracing::debug!(error = %err, "rollback after transaction failure");
    }
}

/// Middleware opening one database transaction per request.
#[derive(Clone)]
pub struct Transaction {
    pool: DbPool,
}

impl Transaction {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Transaction
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = TransactionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TransactionMiddleware {
            service: Rc::new(service),
            pool: self.pool.clone(),
        }))
    }
}

/// Service wrapper produced by [`Transaction`].
pub struct TransactionMiddleware<S> {
    service: Rc<S>,
    pool: DbPool,
}

impl<S, B> Service<ServiceRequest> for TransactionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let pool = self.pool.clone();

        Box::pin(async move {
            let mut conn = pool.get_owned().await.map_err(|err| {
                error!(error = %err, "failed to check out a request connection");
                actix_web::Error::from(ApiError::from(DomainError::internal()))
            })?;
            if let Err(err) = begin_read_committed(&mut conn).await {
                error!(error = %err, "failed to begin a request transaction");
                rollback_quietly(&mut conn).await;
                return Err(ApiError::from(DomainError::internal()).into());
            }

            let scope = TransactionScope::new(conn);
            req.extensions_mut().insert(scope.clone());

            let res = service.call(req).await?;

            let mut conn = scope.lock_owned().await;
            if let Err(err) = AnsiTransactionManager::commit_transaction(&mut **conn).await {
                error!(error = %err, "failed to commit a request transaction");
                rollback_quietly(&mut conn).await;
                return Err(ApiError::from(DomainError::internal()).into());
            }

            Ok(res)
        })
    }
}
