//! Transactions waiting in the pool or sealed into blocks

pub mod types;

pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_transaction_shape() {
        let tx = Transaction::reward("miner-1");
        assert_eq!(tx.sender, REWARD_SENDER);
        assert_eq!(tx.recipient, "miner-1");
        assert_eq!(tx.amount, Amount::from(MINING_REWARD));
        assert!(tx.is_reward());
    }

    #[test]
    fn test_regular_transaction_is_not_reward() {
        let tx = Transaction::new("alice", "bob", 5u64);
        assert!(!tx.is_reward());
    }

    #[test]
    fn test_amount_keeps_integer_and_float_forms() {
        let int: Amount = serde_json::from_str("3").unwrap();
        let float: Amount = serde_json::from_str("3.0").unwrap();

        assert_eq!(serde_json::to_string(&int).unwrap(), "3");
        assert_eq!(serde_json::to_string(&float).unwrap(), "3.0");
        assert_eq!(int.as_f64(), float.as_f64());
    }

    #[test]
    fn test_amount_integer_range() {
        for exact in ["18446744073709551615", "-9223372036854775808"] {
            let amount: Amount = serde_json::from_str(exact).unwrap();
            assert_eq!(serde_json::to_string(&amount).unwrap(), exact);
        }

        let wide: Amount = serde_json::from_str("100000000000000000000").unwrap();
        assert!(wide.as_number().is_f64());
        assert_eq!(wide.as_f64(), 1e20);
    }

    #[test]
    fn test_amount_rejects_non_finite() {
        assert!(Amount::try_from(f64::NAN).is_err());
        assert!(Amount::try_from(f64::INFINITY).is_err());
        assert_eq!(Amount::try_from(2.5).unwrap().as_f64(), 2.5);
    }

    #[test]
    fn test_transaction_wire_field_names() {
        let tx = Transaction::new("alice", "bob", 7u64);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["sender"], "alice");
        assert_eq!(json["recipient"], "bob");
        assert_eq!(json["amount"], 7);
    }
}
