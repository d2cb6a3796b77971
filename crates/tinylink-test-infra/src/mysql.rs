use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;

/// Settings for a disposable MySQL container.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "8.4".to_string(), setter(into))]
    image_tag: String,
    #[builder(default = "tinylink".to_string(), setter(into))]
    database: String,
    #[builder(default = "tinylink".to_string(), setter(into))]
    username: String,
    #[builder(default = "tinylink".to_string(), setter(into))]
    password: String,
}

impl MysqlConfig {
    /// Builds a `mysql://` DSN for the configured account on `host:port`.
    pub fn dsn(&self, host: &str, port: u16) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, self.password, host, port, self.database
        )
    }
}

/// Test fixture for a disposable MySQL server.
///
/// The container is stopped when the fixture is dropped.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    /// Starts a MySQL container and waits until it accepts connections.
    pub async fn new(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", config.image_tag.as_str())
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        Ok(Self { container, config })
    }

    /// DSN for the test database, reachable from the host.
    pub async fn database_url(&self) -> Result<String> {
        let host = self.container.get_host().await?.to_string();
        let port = self.container.get_host_port_ipv4(MYSQL_PORT).await?;
        Ok(self.config.dsn(&host, port))
    }

    pub fn config(&self) -> &MysqlConfig {
        &self.config
    }
}
