// src/pending.rs
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::WalletError;

/// Mutating wallet actions that may only run once at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deploy,
    DepositGas,
    FundEth,
    Faucet,
    SendErc20,
    SendEth,
}

impl Action {
    const ALL: [Action; 6] = [
        Action::Deploy,
        Action::DepositGas,
        Action::FundEth,
        Action::Faucet,
        Action::SendErc20,
        Action::SendEth,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Deploy => "Account deployment",
            Action::DepositGas => "Gas deposit",
            Action::FundEth => "ETH funding",
            Action::Faucet => "Token faucet",
            Action::SendErc20 => "ERC20 transfer",
            Action::SendEth => "ETH transfer",
        };
        f.write_str(name)
    }
}

/// Tracks which actions currently have a transaction in flight.
#[derive(Debug, Default)]
pub struct InFlight {
    flags: [AtomicBool; Action::ALL.len()],
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `action` as pending. The returned guard clears the mark when dropped.
    pub fn begin(&self, action: Action) -> Result<PendingGuard<'_>, WalletError> {
        self.flags[action.index()]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WalletError::Busy(action))?;

        Ok(PendingGuard { owner: self, action })
    }

    #[cfg(test)]
    pub fn is_pending(&self, action: Action) -> bool {
        self.flags[action.index()].load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct PendingGuard<'a> {
    owner: &'a InFlight,
    action: Action,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.owner.flags[self.action.index()].store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_rejected_while_pending() {
        let in_flight = InFlight::new();
        let _guard = in_flight.begin(Action::Deploy).unwrap();

        assert!(in_flight.is_pending(Action::Deploy));
        assert!(matches!(
            in_flight.begin(Action::Deploy),
            Err(WalletError::Busy(Action::Deploy))
        ));
    }

    #[test]
    fn guard_releases_on_drop() {
        let in_flight = InFlight::new();
        {
            let _guard = in_flight.begin(Action::SendEth).unwrap();
        }

        assert!(!in_flight.is_pending(Action::SendEth));
        assert!(in_flight.begin(Action::SendEth).is_ok());
    }

    #[test]
    fn actions_are_tracked_independently() {
        let in_flight = InFlight::new();
        let _deploy = in_flight.begin(Action::Deploy).unwrap();

        assert!(in_flight.begin(Action::DepositGas).is_ok());
        assert!(!in_flight.is_pending(Action::Faucet));
    }

    #[test]
    fn busy_error_names_the_action() {
        let err = WalletError::Busy(Action::Deploy);
        assert_eq!(err.to_string(), "Account deployment is already in progress");
    }
}
