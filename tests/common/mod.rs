#![allow(dead_code)]

/// Common test utilities and helpers for integration tests
/// Provides isolated stores and builders for users and letters

use chithi::error::Result;
use chithi::models::User;
use chithi::services::{Chithi, ComposeLetter, NewUser};
use chithi::Config;
use tempfile::TempDir;

/// Test context holding an isolated app and its temporary directory
pub struct TestContext {
    pub app: Chithi,
    pub config: Config,
    pub temp_dir: TempDir,
}

impl TestContext {
    /// Create a new test context with in-memory storage
    pub fn new_in_memory() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let config = Config::with_data_dir(temp_dir.path());
        Ok(TestContext {
            app: Chithi::in_memory(),
            config,
            temp_dir,
        })
    }

    /// Create a new test context with file-based storage
    pub fn new_with_file_storage() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let config = Config::with_data_dir(temp_dir.path().join("data"));
        let app = Chithi::open(&config)?;
        Ok(TestContext {
            app,
            config,
            temp_dir,
        })
    }

    /// A second handle on the same database, like another process would have
    pub fn reopen(&self) -> Result<Chithi> {
        Chithi::open(&self.config)
    }

    /// Register `username` with default fields; leaves them signed in
    pub fn register(&self, username: &str) -> Result<User> {
        self.app.accounts().register(TestUserBuilder::new().username(username).build())
    }

    pub fn login(&self, username: &str) -> Result<User> {
        self.app.accounts().login(username, TestUserBuilder::DEFAULT_PASSWORD)
    }
}

/// Helper for creating registration forms
pub struct TestUserBuilder {
    username: String,
    email: Option<String>,
    password: String,
    confirm_password: Option<String>,
    mobile: String,
    full_name: String,
}

impl Default for TestUserBuilder {
    fn default() -> Self {
        TestUserBuilder {
            username: "test_user".to_string(),
            email: None,
            password: Self::DEFAULT_PASSWORD.to_string(),
            confirm_password: None,
            mobile: "01700000000".to_string(),
            full_name: String::new(),
        }
    }
}

impl TestUserBuilder {
    pub const DEFAULT_PASSWORD: &'static str = "secret";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    pub fn confirm_password(mut self, confirm: &str) -> Self {
        self.confirm_password = Some(confirm.to_string());
        self
    }

    pub fn mobile(mut self, mobile: &str) -> Self {
        self.mobile = mobile.to_string();
        self
    }

    pub fn full_name(mut self, full_name: &str) -> Self {
        self.full_name = full_name.to_string();
        self
    }

    pub fn build(self) -> NewUser {
        NewUser {
            email: self
                .email
                .unwrap_or_else(|| format!("{}@example.com", self.username)),
            confirm_password: self.confirm_password.unwrap_or_else(|| self.password.clone()),
            username: self.username,
            password: self.password,
            mobile: self.mobile,
            full_name: self.full_name,
            ..NewUser::default()
        }
    }
}

/// Helper for composing letters
pub struct TestLetterBuilder {
    recipient: String,
    content: String,
}

impl Default for TestLetterBuilder {
    fn default() -> Self {
        TestLetterBuilder {
            recipient: "test_user".to_string(),
            content: "test letter".to_string(),
        }
    }
}

impl TestLetterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to(mut self, recipient: &str) -> Self {
        self.recipient = recipient.to_string();
        self
    }

    pub fn content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn build(self) -> ComposeLetter {
        ComposeLetter::new(self.recipient, self.content)
    }
}
