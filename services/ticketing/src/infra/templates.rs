//! Email bodies. Every message has an HTML part and a plain-text part.

use campustix_domain::id::TicketId;

use crate::domain::types::{EventSummary, VERIFICATION_TOKEN_TTL_HOURS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub html: String,
    pub text: String,
}

pub fn confirmation_subject(event_name: &str) -> String {
    format!("Your Ticket for {event_name}")
}

pub fn verification_email(verification_url: &str, event_name: &str) -> RenderedEmail {
    let url = escape_html(verification_url);
    let name = escape_html(event_name);
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Verify Your Email for {name} Ticket</h2>
  <p>You have received a ticket consent request for <strong>{name}</strong>.</p>
  <p>To verify your email and continue with ticket issuance:</p>
  <ol>
    <li>Click the verification link below</li>
    <li>Connect your wallet when prompted</li>
    <li>Sign to give consent for ticket issuance</li>
  </ol>
  <p><a href="{url}" style="display: inline-block; background-color: #4f46e5; color: white; padding: 10px 20px; text-decoration: none; border-radius: 4px;">Verify Email &amp; Connect Wallet</a></p>
  <p>This link will expire in {VERIFICATION_TOKEN_TTL_HOURS} hours.</p>
  <p>If you did not request this ticket, please ignore this email.</p>
</div>"#
    );
    let text = format!(
        "You have received a ticket consent request for {event_name}.\n\n\
         Verify your email and connect your wallet:\n{verification_url}\n\n\
         This link will expire in {VERIFICATION_TOKEN_TTL_HOURS} hours.\n\
         If you did not request this ticket, please ignore this email.\n"
    );
    RenderedEmail { html, text }
}

pub fn ticket_confirmation_email(
    event: &EventSummary,
    ticket_id: TicketId,
    qr_reference: &str,
) -> RenderedEmail {
    let name = escape_html(&event.name);
    let date = event.date.format("%B %-d, %Y").to_string();
    let time = event.time.format("%-I:%M %p").to_string();
    let location = escape_html(&event.location);
    let organizer = escape_html(&event.organizer);
    let qr = escape_html(qr_reference);
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Your Ticket is Confirmed!</h2>
  <p>Your ticket for <strong>{name}</strong> has been confirmed and issued on the ledger.</p>
  <div style="background-color: #f9f9f9; padding: 15px; border-radius: 5px; margin: 20px 0;">
    <h3 style="margin-top: 0;">Event Details:</h3>
    <p><strong>Date:</strong> {date}</p>
    <p><strong>Time:</strong> {time}</p>
    <p><strong>Location:</strong> {location}</p>
    <p><strong>Organizer:</strong> {organizer}</p>
    <p><strong>Ticket ID:</strong> {ticket_id}</p>
  </div>
  <p>Present this QR reference at the event entrance:<br><code>{qr}</code></p>
</div>"#
    );
    let text = format!(
        "Your ticket for {} has been confirmed.\n\n\
         Date: {date}\nTime: {time}\nLocation: {}\nOrganizer: {}\nTicket ID: {ticket_id}\n\n\
         Present this QR reference at the event entrance:\n{qr_reference}\n",
        event.name, event.location, event.organizer
    );
    RenderedEmail { html, text }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
