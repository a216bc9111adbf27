//! Customer command handlers.

use std::sync::Arc;

use tabled::Tabled;

use amlctl_core::model::{CreateCustomerRequest, Customer, RiskLevel, UpdateCustomerRequest};
use amlctl_core::{Console, Route};

use crate::cli::{CustomersArgs, CustomersCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    customer_type: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "KYC")]
    kyc: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn row(c: &Arc<Customer>, color: bool) -> CustomerRow {
    CustomerRow {
        id: c.id.to_string(),
        name: c.name.clone(),
        customer_type: util::or_dash(c.customer_type.as_deref()),
        risk: output::level(c.risk_level, color),
        kyc: util::or_dash(c.kyc_status.as_deref()),
        status: util::or_dash(c.status.as_deref()),
    }
}

fn detail(c: &Customer, color: bool) -> String {
    output::detail(&[
        ("ID", c.id.to_string()),
        ("Name", c.name.clone()),
        ("Email", util::or_dash(c.email.as_deref())),
        ("Phone", util::or_dash(c.phone.as_deref())),
        ("Type", util::or_dash(c.customer_type.as_deref())),
        ("Nationality", util::or_dash(c.nationality.as_deref())),
        ("Risk", output::level(c.risk_level, color)),
        (
            "Risk score",
            c.risk_score.map_or_else(|| "-".into(), |s| format!("{s:.1}")),
        ),
        ("KYC", util::or_dash(c.kyc_status.as_deref())),
        ("Status", util::or_dash(c.status.as_deref())),
        ("Created", util::when(c.created_at)),
    ])
}

const RISK_LEVELS: &str = "low, medium, high, critical";

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    console: &Console,
    args: CustomersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require(console, Route::Customers)?;
    let customers = console.customers();
    let color = output::should_color(&global.color);

    match args.command {
        CustomersCommand::List(list) => {
            util::list(customers, &list, global, |c| row(c, color)).await
        }

        CustomersCommand::Get { id } => {
            util::show(customers, &id, global, |c| detail(c, color)).await
        }

        CustomersCommand::Create {
            name,
            email,
            phone,
            customer_type,
            nationality,
        } => {
            let body = CreateCustomerRequest {
                name,
                email,
                phone,
                customer_type,
                nationality,
            };
            let created = customers.create(&body).await?;
            output::done(&format!("Customer {} created", created.id), global.quiet, color);
            util::print_record(created.as_ref(), global, |c| detail(c, color));
            Ok(())
        }

        CustomersCommand::Update {
            id,
            name,
            email,
            phone,
            status,
            kyc_status,
        } => {
            let body = UpdateCustomerRequest {
                name,
                email,
                phone,
                status,
                kyc_status,
            };
            let updated = customers.update(&util::parse_id(&id), &body).await?;
            output::done(&format!("Customer {id} updated"), global.quiet, color);
            util::print_record(updated.as_ref(), global, |c| detail(c, color));
            Ok(())
        }

        CustomersCommand::Risk {
            id,
            level,
            justification,
        } => {
            let level: RiskLevel = util::parse_enum("level", &level, RISK_LEVELS)?;
            let updated = customers
                .update_risk_level(&util::parse_id(&id), level, &justification)
                .await?;
            output::done(
                &format!("Risk level of {id} set to {}", updated.risk_level),
                global.quiet,
                color,
            );
            Ok(())
        }

        CustomersCommand::Upload {
            id,
            file,
            document_type,
        } => {
            let attachment = util::read_attachment(&file)?;
            customers
                .upload_document(&util::parse_id(&id), &document_type, attachment)
                .await?;
            output::done(
                &format!("{} uploaded to customer {id}", file.display()),
                global.quiet,
                color,
            );
            Ok(())
        }
    }
}
