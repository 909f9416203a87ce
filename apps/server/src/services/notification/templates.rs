//! HTML mail templates for visitor notifications.

use chrono::{DateTime, Utc};

use crate::models::VisitDetails;

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { background: #4FD1C7; color: white; padding: 20px; text-align: center; border-radius: 8px 8px 0 0; }
        .content { background: #f9f9f9; padding: 20px; border-radius: 0 0 8px 8px; }
        .alert { background: #fee; border: 1px solid #fcc; padding: 15px; border-radius: 5px; margin: 15px 0; }
        .info { background: #e7f3ff; border: 1px solid #b3d9ff; padding: 15px; border-radius: 5px; margin: 15px 0; }
        .footer { text-align: center; margin-top: 20px; color: #666; font-size: 12px; }"#;

/// Rendered subject and body
#[derive(Debug, Clone)]
pub struct RenderedMail {
    pub subject: String,
    pub html_body: String,
}

/// Formats a timestamp the way it appears in mail, e.g. `05 Mar 2025, 02:30 PM`
pub fn display_time(ts: DateTime<Utc>) -> String {
    ts.format("%d %b %Y, %I:%M %p").to_string()
}

/// Minimal HTML escaping for user-supplied values
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

fn wrap(site_name: &str, heading: &str, content: &str, now: DateTime<Utc>, kind: &str) -> String {
    let site = html_escape(site_name);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>{style}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{heading}</h1>
            <p>{site} Security System</p>
        </div>
        <div class="content">
{content}
        </div>
        <div class="footer">
            <p>This is an automated {kind} from {site} Security Management System</p>
            <p>Generated on {generated}</p>
        </div>
    </div>
</body>
</html>"#,
        style = STYLE,
        heading = heading,
        site = site,
        content = content,
        kind = kind,
        generated = display_time(now),
    )
}

fn row(label: &str, value: &str) -> String {
    format!(
        "                <p><strong>{}:</strong> {}</p>\n",
        label, value
    )
}

/// Overstay alert for admin and security staff.
///
/// `elapsed_minutes` is the time on premises; the overstay is the part of it
/// beyond the expected duration.
pub fn overstay_alert(
    site_name: &str,
    visit: &VisitDetails,
    elapsed_minutes: i64,
    now: DateTime<Utc>,
) -> RenderedMail {
    let overstay = (elapsed_minutes - i64::from(visit.expected_duration)).max(0);

    let mut content = String::new();
    content.push_str(
        r#"            <div class="alert">
                <h2>⚠️ Immediate Attention Required</h2>
                <p>A visitor has exceeded their allocated time and is still on the premises.</p>
            </div>
            <div class="info">
                <h3>Visitor Information:</h3>
"#,
    );
    content.push_str(&row("Name", &html_escape(&visit.visitor_name)));
    content.push_str(&row("Phone", &html_escape(&visit.visitor_phone)));
    content.push_str(&row("Flat", &html_escape(&visit.flat_number)));
    content.push_str(&row("Flat Owner", &html_escape(&visit.owner_name)));
    content.push_str(&row(
        "Purpose",
        &html_escape(visit.purpose.as_deref().unwrap_or_default()),
    ));
    content.push_str(
        r#"            </div>
            <div class="info">
                <h3>Time Information:</h3>
"#,
    );
    content.push_str(&row("Check-in Time", &display_time(visit.check_in_time)));
    content.push_str(&row(
        "Expected Duration",
        &format!("{} minutes", visit.expected_duration),
    ));
    content.push_str(&row(
        "Time on Premises",
        &format!("{} minutes", elapsed_minutes),
    ));
    content.push_str(&row("Overstay Time", &format!("{} minutes", overstay)));
    content.push_str(&row("Current Time", &display_time(now)));
    content.push_str(
        r#"            </div>
            <div class="info">
                <h3>Security Information:</h3>
"#,
    );
    content.push_str(&row("Guard on Duty", &html_escape(&visit.guard_name)));
    content.push_str(&row("Guard Phone", &html_escape(&visit.guard_phone)));
    content.push_str(
        r#"            </div>
            <p><strong>Action Required:</strong> Please contact the security guard or visit the premises to verify the visitor's status.</p>"#,
    );

    RenderedMail {
        subject: format!("🚨 Visitor Overstay Alert - {}", site_name),
        html_body: wrap(site_name, "🚨 Visitor Overstay Alert", &content, now, "alert"),
    }
}

/// Check-in notice for the flat owner
pub fn checkin_notice(site_name: &str, visit: &VisitDetails, now: DateTime<Utc>) -> RenderedMail {
    let mut content = format!(
        "            <p>Hello {},</p>\n            <p>A visitor has checked in to visit your flat.</p>\n",
        html_escape(&visit.owner_name)
    );
    content.push_str(
        r#"            <div class="info">
                <h3>Visitor Information:</h3>
"#,
    );
    content.push_str(&row("Name", &html_escape(&visit.visitor_name)));
    content.push_str(&row("Phone", &html_escape(&visit.visitor_phone)));
    content.push_str(&row(
        "Purpose",
        &html_escape(visit.purpose.as_deref().unwrap_or_default()),
    ));
    content.push_str(&row(
        "Expected Duration",
        &format!("{} minutes", visit.expected_duration),
    ));
    content.push_str(&row("Check-in Time", &display_time(visit.check_in_time)));
    content.push_str(&row("Guard on Duty", &html_escape(&visit.guard_name)));
    content.push_str(
        r#"            </div>
            <p>If you are not expecting this visitor, please contact security immediately.</p>"#,
    );

    RenderedMail {
        subject: format!("👤 Visitor Check-in Notification - {}", site_name),
        html_body: wrap(
            site_name,
            "👤 Visitor Check-in Notification",
            &content,
            now,
            "notification",
        ),
    }
}

/// Check-out notice for the flat owner. `checked_out_at` is the visit's
/// check-out time.
pub fn checkout_notice(
    site_name: &str,
    visit: &VisitDetails,
    checked_out_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> RenderedMail {
    let total_minutes = (checked_out_at - visit.check_in_time).num_minutes();

    let mut content = format!(
        "            <p>Hello {},</p>\n            <p>Your visitor has checked out of the premises.</p>\n",
        html_escape(&visit.owner_name)
    );
    content.push_str(
        r#"            <div class="info">
                <h3>Visitor Information:</h3>
"#,
    );
    content.push_str(&row("Name", &html_escape(&visit.visitor_name)));
    content.push_str(&row("Phone", &html_escape(&visit.visitor_phone)));
    content.push_str(&row(
        "Purpose",
        &html_escape(visit.purpose.as_deref().unwrap_or_default()),
    ));
    content.push_str(&row("Check-in Time", &display_time(visit.check_in_time)));
    content.push_str(&row("Check-out Time", &display_time(checked_out_at)));
    content.push_str(&row(
        "Total Duration",
        &format!("{} minutes", total_minutes),
    ));
    content.push_str(&row("Guard on Duty", &html_escape(&visit.guard_name)));
    content.push_str(&format!(
        "            </div>\n            <p>Thank you for using {} Security Management System.</p>",
        html_escape(site_name)
    ));

    RenderedMail {
        subject: format!("👋 Visitor Check-out Notification - {}", site_name),
        html_body: wrap(
            site_name,
            "👋 Visitor Check-out Notification",
            &content,
            now,
            "notification",
        ),
    }
}
