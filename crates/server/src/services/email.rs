//! Admin notifications for new orders.
//!
//! Uses SMTP via lettre for delivery with Askama text and HTML templates.
//! Sending happens after the order has committed; failures are logged and
//! never reach the customer.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::{Order, OrderItem};

/// One rendered order line.
struct LineView<'a> {
    name: &'a str,
    quantity: i32,
    price: String,
    total: String,
}

/// HTML template for the new order notification.
#[derive(Template)]
#[template(path = "email/new_order.html")]
struct NewOrderEmailHtml<'a> {
    order: &'a Order,
    lines: &'a [LineView<'a>],
    delivery_fee: String,
    total: String,
}

/// Plain text template for the new order notification.
#[derive(Template)]
#[template(path = "email/new_order.txt")]
struct NewOrderEmailText<'a> {
    order: &'a Order,
    lines: &'a [LineView<'a>],
    delivery_fee: String,
    total: String,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for admin notifications.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    admin_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            admin_address: config.admin_address.clone(),
        })
    }

    /// Tell the shop admin about a newly placed order.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or a template fails to render.
    pub async fn send_new_order(
        &self,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<(), EmailError> {
        let (text, html) = render_new_order(order, items)?;
        let subject = new_order_subject(order);

        self.send_multipart_email(&self.admin_address, &subject, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Send the new order notification in the background.
///
/// Does nothing (beyond a warning) when SMTP is not configured.
pub fn spawn_new_order_notification(
    email: Option<EmailService>,
    order: Order,
    items: Vec<OrderItem>,
) {
    let Some(email) = email else {
        tracing::warn!(
            order_number = %order.order_number,
            "SMTP not configured, skipping new order notification"
        );
        return;
    };

    tokio::spawn(async move {
        if let Err(e) = email.send_new_order(&order, &items).await {
            tracing::error!(
                order_number = %order.order_number,
                error = %e,
                "Failed to send new order notification"
            );
        }
    });
}

fn new_order_subject(order: &Order) -> String {
    format!("New Order Received: {}", order.order_number)
}

fn render_new_order(order: &Order, items: &[OrderItem]) -> Result<(String, String), EmailError> {
    let lines: Vec<LineView<'_>> = items
        .iter()
        .map(|item| LineView {
            name: &item.product_name,
            quantity: item.quantity,
            price: item.price.display(),
            total: item.line_total().display(),
        })
        .collect();
    let delivery_fee = order.delivery_fee.display();
    let total = order.total_amount.display();

    let text = NewOrderEmailText {
        order,
        lines: &lines,
        delivery_fee: delivery_fee.clone(),
        total: total.clone(),
    }
    .render()?;
    let html = NewOrderEmailHtml {
        order,
        lines: &lines,
        delivery_fee,
        total,
    }
    .render()?;

    Ok((text, html))
}
