use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Hosted checkout providers supported by the wallet deposit endpoint
pub enum PaymentMethod {
    #[serde(rename = "vnpay")]
    VnPay,
    #[serde(rename = "momo")]
    MoMo,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::VnPay => "vnpay",
            PaymentMethod::MoMo => "momo",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

impl std::str::FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vnpay" => Ok(PaymentMethod::VnPay),
            "momo" => Ok(PaymentMethod::MoMo),
            _ => Err(UnknownPaymentMethod(s.to_owned())),
        }
    }
}
