use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string for the durable key-value backend. When
    /// unset the server runs on the in-memory backend (nothing survives a
    /// restart).
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Emails that receive the admin role at signup.
    pub admin_emails: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok();
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let admin_emails = env::var("ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(|email| email.trim().to_ascii_lowercase())
                    .filter(|email| !email.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            admin_emails,
        })
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.to_ascii_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}
