use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_access_expiry: i64,
    pub operator_login: String,
    pub operator_password: String,
    pub analyzer_api_url: String,
    pub analyzer_api_key: String,
    pub analyzer_enabled: bool,
    pub minio_endpoint: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub minio_bucket: String,
    pub minio_public_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_access_expiry: env::var("JWT_ACCESS_EXPIRY")
                .unwrap_or_else(|_| "43200".to_string())
                .parse()
                .unwrap_or(43200),
            operator_login: env::var("OPERATOR_LOGIN")?,
            operator_password: env::var("OPERATOR_PASSWORD")?,
            analyzer_api_url: env::var("ANALYZER_API_URL")
                .unwrap_or_else(|_| "http://localhost:9090/v1/analyze".to_string()),
            analyzer_api_key: env::var("ANALYZER_API_KEY").unwrap_or_default(),
            analyzer_enabled: env::var("ANALYZER_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            minio_endpoint: env::var("MINIO_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            minio_access_key: env::var("MINIO_ACCESS_KEY")
                .unwrap_or_else(|_| "minioadmin".to_string()),
            minio_secret_key: env::var("MINIO_SECRET_KEY")
                .unwrap_or_else(|_| "minioadmin".to_string()),
            minio_bucket: env::var("MINIO_BUCKET")
                .unwrap_or_else(|_| "tokbill".to_string()),
            minio_public_url: env::var("MINIO_PUBLIC_URL").ok(),
        })
    }
}
