use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Fixed UTC offset, in hours, used to present times to end users.
    pub display_offset_hours: i32,
    pub video_api_url: String,
    pub video_api_key: String,
    pub video_api_secret: String,
    pub mail_service_url: String,
    pub mail_service_token: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            display_offset_hours: env::var("DISPLAY_UTC_OFFSET_HOURS")
                .unwrap_or_else(|_| "-6".to_string())
                .parse()
                .expect("DISPLAY_UTC_OFFSET_HOURS must be a whole number of hours"),
            video_api_url: env::var("VIDEO_API_URL").unwrap_or_else(|_| "https://video.stream-io-api.com".to_string()),
            video_api_key: env::var("VIDEO_API_KEY").expect("VIDEO_API_KEY must be set"),
            video_api_secret: env::var("VIDEO_API_SECRET").expect("VIDEO_API_SECRET must be set"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
        }
    }
}
