// Searchable field tables per record type.

use super::{Alert, Case, Customer, Device, Report, Searchable, Transaction};

fn push<'a>(out: &mut Vec<&'a str>, value: Option<&'a String>) {
    if let Some(v) = value {
        out.push(v.as_str());
    }
}

impl Searchable for Customer {
    fn search_text(&self) -> Vec<&str> {
        let mut out = vec![self.name.as_str()];
        push(&mut out, self.email.as_ref());
        push(&mut out, self.phone.as_ref());
        push(&mut out, self.nationality.as_ref());
        out
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "risk_level" | "risk" => Some(self.risk_level.to_string()),
            "status" => self.status.clone(),
            "kyc_status" | "kyc" => self.kyc_status.clone(),
            "customer_type" | "type" => self.customer_type.clone(),
            "nationality" => self.nationality.clone(),
            _ => None,
        }
    }
}

impl Searchable for Transaction {
    fn search_text(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(4);
        push(&mut out, self.reference.as_ref());
        push(&mut out, self.customer_name.as_ref());
        push(&mut out, self.counterparty.as_ref());
        push(&mut out, self.flag_reason.as_ref());
        out
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "status" => Some(self.status.to_string()),
            "currency" => self.currency.clone(),
            "transaction_type" | "type" => self.transaction_type.clone(),
            "channel" => self.channel.clone(),
            "country" => self.country.clone(),
            "customer_id" | "customer" => self.customer_id.as_ref().map(ToString::to_string),
            _ => None,
        }
    }
}

impl Searchable for Alert {
    fn search_text(&self) -> Vec<&str> {
        let mut out = vec![self.title.as_str()];
        push(&mut out, self.description.as_ref());
        push(&mut out, self.alert_type.as_ref());
        push(&mut out, self.assigned_to.as_ref());
        out
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "status" => Some(self.status.to_string()),
            "severity" => Some(self.severity.to_string()),
            "alert_type" | "type" => self.alert_type.clone(),
            "assigned_to" | "assignee" => self.assigned_to.clone(),
            _ => None,
        }
    }
}

impl Searchable for Case {
    fn search_text(&self) -> Vec<&str> {
        let mut out = vec![self.title.as_str()];
        push(&mut out, self.case_number.as_ref());
        push(&mut out, self.description.as_ref());
        push(&mut out, self.assigned_to.as_ref());
        out
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "status" => Some(self.status.to_string()),
            "priority" => Some(self.priority.to_string()),
            "assigned_to" | "assignee" => self.assigned_to.clone(),
            _ => None,
        }
    }
}

impl Searchable for Report {
    fn search_text(&self) -> Vec<&str> {
        let mut out = vec![self.title.as_str(), self.report_type.as_str()];
        push(&mut out, self.reference.as_ref());
        push(&mut out, self.reporting_period.as_ref());
        out
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "status" => Some(self.status.to_string()),
            "report_type" | "type" => Some(self.report_type.clone()),
            "reporting_period" | "period" => self.reporting_period.clone(),
            _ => None,
        }
    }
}

impl Searchable for Device {
    fn search_text(&self) -> Vec<&str> {
        let mut out = vec![self.name.as_str()];
        push(&mut out, self.os.as_ref());
        push(&mut out, self.browser.as_ref());
        push(&mut out, self.location.as_ref());
        push(&mut out, self.ip_address.as_ref());
        out
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "trusted" => Some(self.trusted.to_string()),
            "device_type" | "type" => self.device_type.clone(),
            _ => None,
        }
    }
}
