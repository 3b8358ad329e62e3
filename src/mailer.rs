//! # Mail Collaborators
//!
//! The user resource sends a password-reset mail after every create. Both
//! halves are injected:
//!
//! - [`TemplateRenderer`] turns a template name and variables into HTML.
//! - [`Mailer`] delivers the HTML.
//!
//! [`JinjaRenderer`] renders `minijinja` templates with HTML escaping on.
//! [`MemoryMailer`] keeps deliveries in memory. SMTP transports plug in behind
//! the same trait.

use async_trait::async_trait;
use minijinja::{Environment, UndefinedBehavior};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

pub const PASSWORD_RESET_TEMPLATE: &str = "passwordReset";

// Registered names carry `.html` so minijinja auto-escapes every value.
const PASSWORD_RESET_HTML: &str = "passwordReset.html";
const PASSWORD_RESET_BODY: &str = "<p>Hi {{ name or \"there\" }},</p>\
<p>An account was created for you on {{ app.name }}. Choose a password here:</p>\
<p><a href=\"{{ resetLink }}\">{{ resetLink }}</a></p>\
<p>The link expires in 24 hours.</p>";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum MailError {
    #[error("unable to render {template}: {message}")]
    Render { template: String, message: String },

    #[error("unable to deliver to {recipient}: {message}")]
    Delivery { recipient: String, message: String },

    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },
}

#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn render(&self, template: &str, vars: &Value) -> Result<String, MailError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub recipient: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html: &str,
    ) -> Result<DeliveryReceipt, MailError>;
}

fn html_name(template: &str) -> String {
    format!("{template}.html")
}

fn render_error(template: &str, e: minijinja::Error) -> MailError {
    MailError::Render {
        template: template.to_string(),
        message: e.to_string(),
    }
}

/// Renders HTML mail from `minijinja` templates. Values are escaped, and a
/// variable missing from the context is a render error.
pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl Default for JinjaRenderer {
    /// A renderer holding the built-in `passwordReset` template.
    fn default() -> Self {
        let mut renderer = Self::new();
        if let Err(e) = renderer.env.add_template(PASSWORD_RESET_HTML, PASSWORD_RESET_BODY) {
            warn!(error = %e, "Built-in reset template rejected");
        }
        renderer
    }
}

impl JinjaRenderer {
    /// A renderer with no templates.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }

    /// Registers `body` under `name`. Syntax errors are reported here.
    pub fn with_template(
        mut self,
        name: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, MailError> {
        let name = name.into();
        self.env
            .add_template_owned(html_name(&name), body.into())
            .map_err(|e| render_error(&name, e))?;
        Ok(self)
    }
}

#[async_trait]
impl TemplateRenderer for JinjaRenderer {
    async fn render(&self, template: &str, vars: &Value) -> Result<String, MailError> {
        self.env
            .get_template(&html_name(template))
            .and_then(|compiled| compiled.render(vars))
            .map_err(|e| render_error(template, e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub message_id: String,
    pub recipient: String,
    pub subject: String,
    pub html: String,
}

/// Keeps delivered mail in memory. Can be switched to fail every delivery.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deliveries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html: &str,
    ) -> Result<DeliveryReceipt, MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Delivery {
                recipient: recipient.to_string(),
                message: "transport unavailable".into(),
            });
        }
        let mail = SentMail {
            message_id: Uuid::new_v4().to_string(),
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        };
        let receipt = DeliveryReceipt {
            message_id: mail.message_id.clone(),
            recipient: mail.recipient.clone(),
        };
        let mut outbox = self.outbox.lock().map_err(|_| MailError::Delivery {
            recipient: recipient.to_string(),
            message: "outbox poisoned".into(),
        })?;
        outbox.push(mail);
        debug!(recipient, message_id = %receipt.message_id, "Mail stored");
        Ok(receipt)
    }
}
