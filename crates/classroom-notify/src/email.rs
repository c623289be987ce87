//! Email subject and body rendering.
//!
//! One shared HTML shell with the classroom branding; the plain-text
//! alternative mirrors the content for clients that strip HTML.

/// A rendered message, ready to hand to a mailer with an address.
#[derive(Debug, Clone)]
pub(crate) struct RenderedEmail {
  pub subject: String,
  pub html:    String,
  pub text:    String,
}

fn shell(heading: &str, body_html: &str) -> String {
  format!(
    "<!DOCTYPE html>\n\
     <html>\n\
       <body style=\"font-family: sans-serif; color: #333; background: #f5f5f5; margin: 0;\">\n\
         <div style=\"max-width: 600px; margin: 0 auto; background: #ffffff;\">\n\
           <div style=\"background: #2563eb; color: white; padding: 30px 20px; text-align: center;\">\n\
             <h1 style=\"margin: 0;\">LinuxWorld Classroom</h1>\n\
           </div>\n\
           <div style=\"padding: 40px 30px;\">\n\
             <h2>{heading}</h2>\n\
             {body_html}\n\
           </div>\n\
           <div style=\"background: #f8fafc; text-align: center; padding: 25px 20px; color: #64748b; font-size: 13px;\">\n\
             <p>This is an automated message. Please do not reply.</p>\n\
           </div>\n\
         </div>\n\
       </body>\n\
     </html>\n"
  )
}

/// The email sent for a notification. The subject is the notification
/// title verbatim.
pub(crate) fn notification_email(title: &str, content: &str) -> RenderedEmail {
  let html = shell(
    title,
    &format!("<div style=\"white-space: pre-wrap;\">{content}</div>"),
  );
  let text = format!("{title}\n\n{content}\n");

  RenderedEmail { subject: title.to_owned(), html, text }
}

/// The email sent to a student when an announcement is posted to one of
/// their groups.
pub(crate) fn announcement_email(
  student_name: &str,
  group_names: &str,
  title: &str,
  content: &str,
) -> RenderedEmail {
  let html = shell(
    &format!("New announcement for {group_names}"),
    &format!(
      "<p>Hello {student_name},</p>\n\
       <h3>{title}</h3>\n\
       <div style=\"white-space: pre-wrap; background: #f8fafc; border-left: 4px solid #2563eb; padding: 20px;\">{content}</div>"
    ),
  );
  let text = format!(
    "Hello {student_name},\n\nNew announcement for {group_names}:\n\n{title}\n\n{content}\n"
  );

  RenderedEmail {
    subject: format!("New Announcement: {title}"),
    html,
    text,
  }
}
