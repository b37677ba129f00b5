use super::ui;
use crate::core::identity::UserId;
use crate::core::notification::{NotificationService, NotificationSettings, NotificationUpdate};
use anyhow::Result;
use comfy_table::Cell;

pub fn settings_table(settings: &NotificationSettings) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Setting"), ui::header_cell("Value")]);
    table.add_row(vec![
        Cell::new("Daily digest"),
        Cell::new(if settings.daily_digest_enabled {
            "enabled"
        } else {
            "disabled"
        }),
    ]);
    table.add_row(vec![
        Cell::new("Webhook URL"),
        Cell::new(settings.webhook_url.as_deref().unwrap_or("not set")),
    ]);
    table.add_row(vec![
        Cell::new("Last updated"),
        ui::format_optional_cell(settings.updated_at, |t| {
            t.format("%Y-%m-%d %H:%M UTC").to_string()
        }),
    ]);

    format!(
        "{}\n\n{}",
        ui::style_text("Notifications", ui::StyleType::Title),
        table
    )
}

pub async fn show(service: &NotificationService, owner: &UserId) -> Result<()> {
    let settings = service.settings().get(owner).await?;
    println!("{}", settings_table(&settings));
    Ok(())
}

pub async fn set(
    service: &NotificationService,
    owner: &UserId,
    update: NotificationUpdate,
) -> Result<()> {
    let settings = service.settings().update(owner, update).await?;
    println!("{}", settings_table(&settings));
    Ok(())
}

pub async fn test(service: &NotificationService, owner: &UserId) -> Result<()> {
    service.send_test_message(owner).await?;
    println!("Test message sent");
    Ok(())
}

pub async fn digest(service: &NotificationService) -> Result<()> {
    let pb = ui::new_spinner("Sending daily digest...");
    let report = service.run_daily_digest(&|| pb.inc(1)).await?;
    pb.finish_and_clear();

    let line = format!("Sent {} of {} digests", report.sent, report.total);
    let style = if report.sent == report.total {
        ui::StyleType::TotalValue
    } else {
        ui::StyleType::Warning
    };
    println!("{}", ui::style_text(&line, style));
    Ok(())
}
