use serde::Deserialize;

// =======================================================
// GLOBAL CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub worker_connections: u16,
    pub log_level: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            worker_connections: 1024,
            log_level: "info".into(),
        }
    }
}

impl GlobalConfig {
    pub fn worker_connections(&self) -> u16 {
        self.worker_connections
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

// =======================================================
// HTTP CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub listen: String,
    pub keepalive_timeout_secs: u64,
    pub client_read_timeout_secs: u64,

    // Limits (bytes)
    pub max_request_headers_bytes: u64,
    pub max_request_body_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".into(),
            keepalive_timeout_secs: 65,
            client_read_timeout_secs: 15,
            max_request_headers_bytes: 64 * 1024,
            max_request_body_bytes: 1024 * 1024,
        }
    }
}

impl HttpConfig {
    pub fn listen(&self) -> &str {
        &self.listen
    }

    pub fn keepalive_timeout_secs(&self) -> u64 {
        self.keepalive_timeout_secs
    }

    pub fn client_read_timeout_secs(&self) -> u64 {
        self.client_read_timeout_secs
    }

    pub fn max_request_headers_bytes(&self) -> u64 {
        self.max_request_headers_bytes
    }

    pub fn max_request_body_bytes(&self) -> u64 {
        self.max_request_body_bytes
    }
}

// =======================================================
// DB CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Path of the JSON file holding the user records.
    pub path: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: "users.json".into(),
        }
    }
}

impl DbConfig {
    pub fn path(&self) -> &str {
        &self.path
    }
}

// =======================================================
// AUTH CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "Peter".into(),
            password: "password".into(),
        }
    }
}

impl AuthConfig {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

// =======================================================
// RESTUX CONFIG — main config
// =======================================================
#[derive(Debug, Deserialize)]
pub struct RestuxConfig {
    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub db: DbConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for RestuxConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            http: HttpConfig::default(),
            db: DbConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl RestuxConfig {
    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn http(&self) -> &HttpConfig {
        &self.http
    }

    pub fn db(&self) -> &DbConfig {
        &self.db
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Toml).required(false))
            .build()?;

        let mut cfg: RestuxConfig = built.try_deserialize()?;

        cfg.apply_defaults();
        Ok(cfg)
    }

    fn apply_defaults(&mut self) {
        let def_global = GlobalConfig::default();
        if self.global.worker_connections == 0 {
            self.global.worker_connections = def_global.worker_connections;
        }
        if self.global.log_level.is_empty() {
            self.global.log_level = def_global.log_level.clone();
        }

        let def_http = HttpConfig::default();
        if self.http.listen.is_empty() {
            self.http.listen = def_http.listen.clone();
        }
        if self.http.keepalive_timeout_secs == 0 {
            self.http.keepalive_timeout_secs = def_http.keepalive_timeout_secs;
        }
        if self.http.client_read_timeout_secs == 0 {
            self.http.client_read_timeout_secs = def_http.client_read_timeout_secs;
        }
        if self.http.max_request_headers_bytes == 0 {
            self.http.max_request_headers_bytes = def_http.max_request_headers_bytes;
        }
        if self.http.max_request_body_bytes == 0 {
            self.http.max_request_body_bytes = def_http.max_request_body_bytes;
        }

        if self.db.path.is_empty() {
            self.db.path = DbConfig::default().path;
        }
    }

    pub fn print(&self) {
        println!("================ RESTUX CONFIG ================");

        println!("\n[global]");
        println!("  worker_connections   = {}", self.global.worker_connections);
        println!("  log_level            = {}", self.global.log_level);

        println!("\n[http]");
        println!("  listen               = {}", self.http.listen);
        println!(
            "  keepalive_timeout    = {}",
            self.http.keepalive_timeout_secs
        );
        println!(
            "  client_read_timeout_secs = {}",
            self.http.client_read_timeout_secs
        );
        println!(
            "  max_request_headers_bytes = {}",
            self.http.max_request_headers_bytes
        );
        println!(
            "  max_request_body_bytes = {}",
            self.http.max_request_body_bytes
        );

        println!("\n[db]");
        println!("  path                 = {}", self.db.path);

        println!("\n[auth]");
        println!("  username             = {}", self.auth.username);

        println!("===============================================");
    }
}
