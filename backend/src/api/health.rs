//! Liveness endpoint. Registered outside the transaction scope so probes
//! never touch the database.

use actix_web::{get, web};

#[get("/ping")]
pub async fn ping() -> web::Json<&'static str> {
    web::Json("pong")
}
