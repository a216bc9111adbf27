//! Trusted device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use amlctl_core::model::Device;
use amlctl_core::{Console, Route};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "OS / Browser")]
    platform: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Trusted")]
    trusted: String,
    #[tabled(rename = "Last seen")]
    last_seen: String,
}

fn platform(d: &Device) -> String {
    match (d.os.as_deref(), d.browser.as_deref()) {
        (Some(os), Some(browser)) => format!("{os} / {browser}"),
        (Some(one), None) | (None, Some(one)) => one.to_owned(),
        (None, None) => "-".into(),
    }
}

impl From<&Arc<Device>> for DeviceRow {
    fn from(d: &Arc<Device>) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            kind: util::or_dash(d.device_type.as_deref()),
            platform: platform(d),
            location: util::or_dash(d.location.as_deref()),
            trusted: if d.trusted { "yes" } else { "no" }.into(),
            last_seen: util::when(d.last_seen),
        }
    }
}

fn detail(d: &Device) -> String {
    output::detail(&[
        ("ID", d.id.to_string()),
        ("Name", d.name.clone()),
        ("Type", util::or_dash(d.device_type.as_deref())),
        ("Platform", platform(d)),
        ("IP", util::or_dash(d.ip_address.as_deref())),
        ("Location", util::or_dash(d.location.as_deref())),
        ("Trusted", if d.trusted { "yes" } else { "no" }.into()),
        ("Last seen", util::when(d.last_seen)),
    ])
}

pub async fn handle(
    console: &Console,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require(console, Route::Devices)?;
    let devices = console.devices();
    let color = output::should_color(&global.color);

    match args.command {
        DevicesCommand::List(list) => util::list(devices, &list, global, |d| DeviceRow::from(d)).await,

        DevicesCommand::Get { id } => util::show(devices, &id, global, detail).await,

        DevicesCommand::Trust { id } => {
            devices.set_trusted(&util::parse_id(&id), true).await?;
            output::done(&format!("Device {id} trusted"), global.quiet, color);
            Ok(())
        }

        DevicesCommand::Untrust { id } => {
            devices.set_trusted(&util::parse_id(&id), false).await?;
            output::done(&format!("Device {id} no longer trusted"), global.quiet, color);
            Ok(())
        }

        DevicesCommand::Remove { id } => {
            if !util::confirm(&format!("Remove device {id}?"), global.yes)? {
                return Ok(());
            }
            devices.remove(&util::parse_id(&id)).await?;
            output::done(&format!("Device {id} removed"), global.quiet, color);
            Ok(())
        }
    }
}
