//! Transaction command handlers.

use std::sync::Arc;

use tabled::Tabled;

use amlctl_core::model::{Transaction, TransactionStatus};
use amlctl_core::{Console, Route};

use crate::cli::{GlobalOpts, TransactionsArgs, TransactionsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "When")]
    when: String,
}

fn amount(t: &Transaction) -> String {
    format!("{:.2} {}", t.amount, t.currency.as_deref().unwrap_or(""))
        .trim_end()
        .to_owned()
}

fn row(t: &Arc<Transaction>, color: bool) -> TransactionRow {
    TransactionRow {
        id: t.id.to_string(),
        reference: util::or_dash(t.reference.as_deref()),
        customer: util::or_dash(t.customer_name.as_deref()),
        amount: amount(t),
        kind: util::or_dash(t.transaction_type.as_deref()),
        status: output::level(t.status, color),
        risk: t.risk_score.map_or_else(|| "-".into(), |s| format!("{s:.0}")),
        when: util::when(t.created_at),
    }
}

fn detail(t: &Transaction, color: bool) -> String {
    output::detail(&[
        ("ID", t.id.to_string()),
        ("Reference", util::or_dash(t.reference.as_deref())),
        (
            "Customer",
            match (&t.customer_name, &t.customer_id) {
                (Some(name), Some(id)) => format!("{name} ({id})"),
                (Some(name), None) => name.clone(),
                (None, Some(id)) => id.to_string(),
                (None, None) => "-".into(),
            },
        ),
        ("Amount", amount(t)),
        ("Type", util::or_dash(t.transaction_type.as_deref())),
        ("Channel", util::or_dash(t.channel.as_deref())),
        ("Counterparty", util::or_dash(t.counterparty.as_deref())),
        ("Country", util::or_dash(t.country.as_deref())),
        ("Status", output::level(t.status, color)),
        (
            "Risk score",
            t.risk_score.map_or_else(|| "-".into(), |s| format!("{s:.1}")),
        ),
        ("Flag reason", util::or_dash(t.flag_reason.as_deref())),
        ("When", util::when(t.created_at)),
    ])
}

const STATUSES: &str = "pending, completed, flagged, under_review, blocked, cleared";

pub async fn handle(
    console: &Console,
    args: TransactionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::require(console, Route::Transactions)?;
    let transactions = console.transactions();
    let color = output::should_color(&global.color);

    match args.command {
        TransactionsCommand::List(list) => {
            util::list(transactions, &list, global, |t| row(t, color)).await
        }

        TransactionsCommand::Get { id } => {
            util::show(transactions, &id, global, |t| detail(t, color)).await
        }

        TransactionsCommand::Flag { id, reason } => {
            let flagged = transactions.flag(&util::parse_id(&id), &reason).await?;
            output::done(&format!("Transaction {id} flagged"), global.quiet, color);
            util::print_record(flagged.as_ref(), global, |t| detail(t, color));
            Ok(())
        }

        TransactionsCommand::Status { id, status } => {
            let status: TransactionStatus = util::parse_enum("status", &status, STATUSES)?;
            let updated = transactions
                .update_status(&util::parse_id(&id), status)
                .await?;
            output::done(
                &format!("Transaction {id} is now {}", updated.status),
                global.quiet,
                color,
            );
            Ok(())
        }
    }
}
