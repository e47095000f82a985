//! Diesel schema definitions.

diesel::table! {
    users (id) {
        id -> Uuid,
        #[max_length = 255]
        login -> Varchar,
        #[max_length = 255]
        password -> Varchar,
        #[max_length = 255]
        email -> Nullable<Varchar>,
        #[max_length = 255]
        first_name -> Nullable<Varchar>,
        #[max_length = 255]
        last_name -> Nullable<Varchar>,
        #[max_length = 255]
        middle_name -> Nullable<Varchar>,
        #[max_length = 16]
        sex -> Nullable<Varchar>,
        age -> Nullable<Int2>,
        avatar_url -> Nullable<Varchar>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
