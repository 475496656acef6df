//! Semantic transaction categories shown to the user.

use std::fmt;

use tracing::debug;

use crate::transaction::{TransactionType, WalletOutputs, WalletTransaction};

/// The single semantic category of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    Sent,
    Received,
    MiningReward,
    ProviderRegister,
    ProviderUpdateService,
    ProviderUpdateRegistrar,
    ProviderUpdateRevoke,
    TransferIn,
    TransferOut,
    Internal,
    /// Unrecognized protocol type or malformed stored code. Displayed as unknown,
    /// never as a payment.
    Invalid,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Sent,
        Category::Received,
        Category::MiningReward,
        Category::ProviderRegister,
        Category::ProviderUpdateService,
        Category::ProviderUpdateRegistrar,
        Category::ProviderUpdateRevoke,
        Category::TransferIn,
        Category::TransferOut,
        Category::Internal,
        Category::Invalid,
    ];

    /// Whether the user may override this category.
    pub fn can_be_recategorized(&self) -> bool {
        match self {
            Category::Sent
            | Category::Received
            | Category::TransferIn
            | Category::TransferOut
            | Category::Internal => true,
            Category::MiningReward
            | Category::ProviderRegister
            | Category::ProviderUpdateService
            | Category::ProviderUpdateRegistrar
            | Category::ProviderUpdateRevoke
            | Category::Invalid => false,
        }
    }

    pub fn is_transfer(&self) -> bool {
        match self {
            Category::TransferIn | Category::TransferOut => true,
            Category::Sent
            | Category::Received
            | Category::MiningReward
            | Category::ProviderRegister
            | Category::ProviderUpdateService
            | Category::ProviderUpdateRegistrar
            | Category::ProviderUpdateRevoke
            | Category::Internal
            | Category::Invalid => false,
        }
    }

    /// Stable code used when categories are stored by the wallet.
    pub fn code(&self) -> u8 {
        match self {
            Category::Sent => 0,
            Category::Received => 1,
            Category::MiningReward => 2,
            Category::ProviderRegister => 3,
            Category::ProviderUpdateService => 4,
            Category::ProviderUpdateRegistrar => 5,
            Category::ProviderUpdateRevoke => 6,
            Category::TransferIn => 7,
            Category::TransferOut => 8,
            Category::Internal => 9,
            Category::Invalid => 0xff,
        }
    }

    /// Decode a stored code; anything unknown decodes to [`Category::Invalid`].
    pub fn from_code(code: u8) -> Category {
        Category::ALL.into_iter().find(|c| c.code() == code).unwrap_or(Category::Invalid)
    }

    /// Classify `tx` against the wallet's current output ownership.
    pub fn from_transaction(tx: &WalletTransaction, outputs: &impl WalletOutputs) -> Category {
        classify(Some(tx.protocol_type()), tx.value, tx.is_entirely_internal(outputs))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Sent => "Sent",
            Category::Received => "Received",
            Category::MiningReward => "Mining Reward",
            Category::ProviderRegister => "Masternode Registration",
            Category::ProviderUpdateService => "Masternode Service Update",
            Category::ProviderUpdateRegistrar => "Masternode Registrar Update",
            Category::ProviderUpdateRevoke => "Masternode Revocation",
            Category::TransferIn => "Transfer In",
            Category::TransferOut => "Transfer Out",
            Category::Internal => "Internal Transfer",
            Category::Invalid => "Invalid",
        };
        f.write_str(name)
    }
}

/// Map a transaction's shape to its category. The first matching rule wins.
///
/// `protocol_type` is `None` when the stored type tag is not one
/// [`TransactionType`] knows.
pub fn classify(protocol_type: Option<TransactionType>, value: i64, is_internal: bool) -> Category {
    match protocol_type {
        Some(TransactionType::Coinbase) => return Category::MiningReward,
        Some(TransactionType::ProviderRegistration) => return Category::ProviderRegister,
        Some(TransactionType::ProviderUpdateService) => return Category::ProviderUpdateService,
        Some(TransactionType::ProviderUpdateRegistrar) => return Category::ProviderUpdateRegistrar,
        Some(TransactionType::ProviderUpdateRevocation) => return Category::ProviderUpdateRevoke,
        _ => {}
    }

    if value > 0 {
        Category::Received
    } else if is_internal {
        Category::Internal
    } else if protocol_type.is_none() {
        Category::Invalid
    } else {
        Category::Sent
    }
}

/// [`classify`] for a raw type tag, as stored by the wallet.
pub fn classify_tag(tag: u16, value: i64, is_internal: bool) -> Category {
    let protocol_type = TransactionType::try_from(tag).ok();
    if protocol_type.is_none() {
        debug!("Unrecognized transaction type {}", tag);
    }
    classify(protocol_type, value, is_internal)
}
