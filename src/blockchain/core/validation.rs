use crate::error::{ChainError, Result};
use crate::miner::{ProofOfWork, DEFAULT_DIFFICULTY};
use tracing::debug;

use super::chain::Block;

/// Walk `chain` and certify it, reporting the first block that breaks it.
///
/// Every block after the first must sit at its 1-based position, carry the
/// hash of its predecessor in `previous_hash`, and hold a proof that
/// satisfies the puzzle seeded by the predecessor's proof and hash. The
/// first block is taken as given.
pub fn validate_chain(chain: &[Block], difficulty: usize) -> Result<()> {
    let pow = ProofOfWork::with_difficulty(difficulty);
    let mut blocks = chain.iter();
    let mut last_block = blocks.next().ok_or(ChainError::EmptyChain)?;

    for (offset, block) in blocks.enumerate() {
        let position = offset as u64 + 2;
        let invalid = |reason: String| {
            debug!(index = position, %reason, "chain.invalid");
            ChainError::InvalidChain { index: position, reason }
        };

        if block.index != position {
            return Err(invalid(format!(
                "Invalid block index. Expected {}, but got {}.",
                position, block.index
            )));
        }

        let last_block_hash = last_block.hash();
        if block.previous_hash != last_block_hash {
            return Err(invalid(format!(
                "Invalid previous block hash. Expected {}, but got {}.",
                last_block_hash, block.previous_hash
            )));
        }

        if !pow.valid_proof(last_block.proof, block.proof, &last_block_hash) {
            return Err(invalid(format!(
                "Invalid proof-of-work: {} does not solve the puzzle of block {}.",
                block.proof, last_block.index
            )));
        }

        last_block = block;
    }

    Ok(())
}

/// Whether `chain` is valid at the default difficulty. Empty input counts as
/// invalid.
pub fn is_valid(chain: &[Block]) -> bool {
    validate_chain(chain, DEFAULT_DIFFICULTY).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{Blockchain, Timestamp};
    use crate::transaction::{Amount, Transaction};

    const TEST_DIFFICULTY: usize = 2;

    fn mined_chain(blocks: usize) -> Blockchain {
        let pow = ProofOfWork::with_difficulty(TEST_DIFFICULTY);
        let mut blockchain = Blockchain::new();
        for i in 0..blocks {
            let last = blockchain.last_block().clone();
            let proof = pow.proof_of_work(&last);
            blockchain.new_transaction("alice", "bob", i as u64);
            blockchain.new_transaction("0", "miner", 1u64);
            blockchain.seal_block(proof, None);
        }
        blockchain
    }

    #[test]
    fn test_genesis_only_chain_is_valid() {
        let blockchain = Blockchain::new();
        assert!(validate_chain(blockchain.blocks(), TEST_DIFFICULTY).is_ok());
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_empty_chain_is_reported() {
        assert!(matches!(validate_chain(&[], TEST_DIFFICULTY), Err(ChainError::EmptyChain)));
        assert!(!is_valid(&[]));
    }

    #[test]
    fn test_mined_chain_is_valid() {
        let blockchain = mined_chain(3);
        assert_eq!(blockchain.len(), 4);
        assert!(validate_chain(blockchain.blocks(), TEST_DIFFICULTY).is_ok());
    }

    #[test]
    fn test_unmined_block_is_rejected() {
        let mut blockchain = Blockchain::new();
        let last = blockchain.last_block().clone();
        let pow = ProofOfWork::with_difficulty(TEST_DIFFICULTY);
        let mut bad_proof = 0;
        while pow.valid_proof(last.proof, bad_proof, &last.hash()) {
            bad_proof += 1;
        }
        blockchain.seal_block(bad_proof, None);

        let err = validate_chain(blockchain.blocks(), TEST_DIFFICULTY).unwrap_err();
        assert!(matches!(err, ChainError::InvalidChain { index: 2, .. }));
    }

    #[test]
    fn test_any_single_field_mutation_breaks_chain() {
        let pow = ProofOfWork::with_difficulty(TEST_DIFFICULTY);
        let blockchain = mined_chain(3);
        let original = blockchain.blocks().to_vec();

        // The head's timestamp and transactions are committed to by no later
        // block, so only its index, proof and linkage can be checked.
        for target in 1..original.len() {
            let is_head = target == original.len() - 1;
            let parent_proof = original[target - 1].proof;
            let parent_hash = original[target - 1].hash();

            // A proof that does not solve the parent's puzzle.
            let mut wrong_proof = original[target].proof + 1;
            while pow.valid_proof(parent_proof, wrong_proof, &parent_hash) {
                wrong_proof += 1;
            }

            let mut mutations: Vec<Box<dyn Fn(&mut Block)>> = vec![
                Box::new(|b: &mut Block| b.index += 1),
                Box::new(move |b: &mut Block| b.proof = wrong_proof),
                Box::new(|b: &mut Block| b.previous_hash.push('0')),
            ];
            if !is_head {
                mutations.push(Box::new(|b: &mut Block| {
                    b.timestamp = Timestamp::from_secs_f64(b.timestamp.as_secs_f64() + 1.0)
                }));
                mutations.push(Box::new(|b: &mut Block| b.transactions[0].amount = Amount::from(999u64)));
                mutations.push(Box::new(|b: &mut Block| b.transactions[0].sender.push('x')));
                mutations.push(Box::new(|b: &mut Block| b.transactions.push(Transaction::reward("thief"))));
            }

            for mutate in &mutations {
                let mut tampered = original.clone();
                mutate(&mut tampered[target]);
                assert!(
                    validate_chain(&tampered, TEST_DIFFICULTY).is_err(),
                    "mutation of block {} went undetected",
                    target + 1
                );
            }
        }
    }

    #[test]
    fn test_first_failure_is_reported() {
        let blockchain = mined_chain(3);
        let mut tampered = blockchain.blocks().to_vec();
        tampered[1].previous_hash = "bogus".to_string();
        tampered[3].previous_hash = "also bogus".to_string();

        match validate_chain(&tampered, TEST_DIFFICULTY) {
            Err(ChainError::InvalidChain { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected InvalidChain, got {:?}", other),
        }
    }
}
