use crate::core::{Block, Transaction};
use crate::utils::{encode_hash, Hash};
use log::info;

/// Brute-force nonce search over a fixed transaction snapshot.
///
/// The candidate block carries a zero timestamp, so the nonce found depends
/// only on the transactions, the previous hash and the difficulty.
pub struct ProofOfWork {
    candidate: Block,
    difficulty: usize,
}

impl ProofOfWork {
    pub fn new_proof_of_work(
        transactions: Vec<Transaction>,
        previous_hash: Hash,
        difficulty: usize,
    ) -> ProofOfWork {
        ProofOfWork {
            candidate: Block::with_timestamp(0, 0, previous_hash, transactions),
            difficulty,
        }
    }

    /// Returns the first nonce, counting up from zero, that satisfies the
    /// difficulty. Blocks the calling thread until found.
    pub fn run(mut self) -> u64 {
        let mut nonce: u64 = 0;
        loop {
            self.candidate.set_nonce(nonce);
            if meets_difficulty(&self.candidate.hash(), self.difficulty) {
                info!(
                    "Proof-of-work found nonce {nonce} (difficulty {})",
                    self.difficulty
                );
                return nonce;
            }
            nonce += 1;
        }
    }

    /// Checks a block's own nonce against its transactions and previous hash.
    pub fn validate(block: &Block, difficulty: usize) -> bool {
        meets_difficulty(&block.proof_hash(), difficulty)
    }
}

/// Searches for the nonce that seals `transactions` on top of `previous_hash`.
pub fn proof_of_work(transactions: &[Transaction], previous_hash: &Hash, difficulty: usize) -> u64 {
    ProofOfWork::new_proof_of_work(transactions.to_vec(), *previous_hash, difficulty).run()
}

pub fn valid_proof(
    nonce: u64,
    previous_hash: &Hash,
    transactions: &[Transaction],
    difficulty: usize,
) -> bool {
    let guess = Block::with_timestamp(0, nonce, *previous_hash, transactions.to_vec());
    meets_difficulty(&guess.hash(), difficulty)
}

/// True when the hex digest starts with `difficulty` zero characters.
pub fn meets_difficulty(hash: &Hash, difficulty: usize) -> bool {
    let hex = encode_hash(hash);
    hex.len() >= difficulty && hex.bytes().take(difficulty).all(|c| c == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Token;
    use crate::utils::HASH_LEN;

    fn reward(to: &str) -> Transaction {
        Transaction::new("DENIZ", to, Token::new("DNZ", "10".parse().unwrap()))
    }

    #[test]
    fn test_found_nonce_is_valid() {
        let previous_hash = Block::empty().hash();
        let txs = vec![reward("A")];
        let nonce = ProofOfWork::new_proof_of_work(txs.clone(), previous_hash, 2).run();

        assert!(valid_proof(nonce, &previous_hash, &txs, 2));
        let block = Block::with_timestamp(12345, nonce, previous_hash, txs);
        assert!(ProofOfWork::validate(&block, 2));
        assert!(encode_hash(&block.proof_hash()).starts_with("00"));
    }

    #[test]
    fn test_search_is_first_fit() {
        let previous_hash = [7u8; HASH_LEN];
        let txs = vec![reward("B")];
        let nonce = ProofOfWork::new_proof_of_work(txs.clone(), previous_hash, 2).run();

        for smaller in 0..nonce {
            assert!(!valid_proof(smaller, &previous_hash, &txs, 2));
        }
    }

    #[test]
    fn test_search_is_deterministic() {
        let previous_hash = [9u8; HASH_LEN];
        let txs = vec![reward("C")];
        let first = ProofOfWork::new_proof_of_work(txs.clone(), previous_hash, 2).run();
        let second = ProofOfWork::new_proof_of_work(txs, previous_hash, 2).run();
        assert_eq!(first, second);
    }

    #[test]
    fn test_difficulty_predicate() {
        let mut hash = [0xffu8; HASH_LEN];
        assert!(meets_difficulty(&hash, 0));
        assert!(!meets_difficulty(&hash, 1));

        hash[0] = 0x00;
        hash[1] = 0x0f;
        assert!(meets_difficulty(&hash, 3));
        assert!(!meets_difficulty(&hash, 4));
        assert!(!meets_difficulty(&hash, 65));
    }
}
