use actix_cors::Cors;

/// Any origin when `allowed_origin` is `None`, otherwise only the site itself.
pub fn create_cors(allowed_origin: Option<&str>) -> Cors {
    let cors = match allowed_origin {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allowed_origin_fn(|_, _req_head| true),
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}
