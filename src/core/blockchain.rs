use crate::config::ChainConfig;
use crate::core::proof_of_work::{proof_of_work, ProofOfWork};
use crate::core::{Amount, Block, Token, Transaction, TransactionRequest};
use crate::error::Result;
use crate::network::{HttpPeerClient, Nodes, PeerClient, PeerScanner};
use crate::storage::{HeadStore, MemoryPool};
use crate::utils::{encode_hash, Hash, PeriodicTask, PublicKey, Signature};
use crate::wallet::{convert_address, hash_pub_key};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One node's view of the ledger: the in-memory chain, the pool of pending
/// transactions, the current peer set and the durable head hash.
///
/// Locking: `mining_lock` serializes every mutation of chain and pool
/// (admission, mining, block creation, chain replacement). `sync_lock`
/// serializes peer discovery. No peer call is ever made while `mining_lock`
/// is held.
pub struct Blockchain {
    chain: RwLock<Vec<Block>>,
    transaction_pool: MemoryPool,
    blockchain_address: String,
    nodes: Nodes,
    mining_lock: Mutex<()>,
    sync_lock: Mutex<()>,
    head_store: HeadStore,
    peer_client: Arc<dyn PeerClient>,
    scanner: PeerScanner,
    config: ChainConfig,
    mining_task: Mutex<Option<PeriodicTask>>,
}

/// Handle to the background loops started by `run`. Stopping or dropping it
/// stops both the sync loop and the mining loop.
pub struct NodeTasks {
    ledger: Arc<Blockchain>,
    sync_task: Option<PeriodicTask>,
}

impl NodeTasks {
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for NodeTasks {
    fn drop(&mut self) {
        self.ledger.stop_mining();
        if let Some(sync_task) = self.sync_task.take() {
            sync_task.stop();
        }
    }
}

impl Blockchain {
    /// Builds a ledger whose genesis block links to the stored head, or to
    /// the hash of the empty block when the store is fresh. The genesis hash
    /// then becomes the new head.
    pub fn create_blockchain(
        blockchain_address: &str,
        config: ChainConfig,
        head_store: HeadStore,
        peer_client: Arc<dyn PeerClient>,
    ) -> Result<Blockchain> {
        config.validate()?;
        let last_hash = head_store.get_or_init_head(&Block::empty().hash())?;

        let blockchain = Blockchain {
            chain: RwLock::new(Vec::new()),
            transaction_pool: MemoryPool::new(),
            blockchain_address: blockchain_address.to_string(),
            nodes: Nodes::new(),
            mining_lock: Mutex::new(()),
            sync_lock: Mutex::new(()),
            head_store,
            peer_client,
            scanner: PeerScanner::from_config(&config),
            config,
            mining_task: Mutex::new(None),
        };

        let genesis = Block::new_block(0, last_hash, Vec::new())?;
        let genesis_hash = genesis.hash();
        blockchain.write_chain().push(genesis);
        blockchain.head_store.set_head(&genesis_hash)?;
        info!(
            "Created genesis block {} for {blockchain_address}",
            encode_hash(&genesis_hash)
        );
        Ok(blockchain)
    }

    /// Opens the head store at the configured path and talks to peers over HTTP.
    pub fn open(blockchain_address: &str, config: ChainConfig) -> Result<Blockchain> {
        let head_store = HeadStore::open(&config.get_db_path())?;
        let peer_client = Arc::new(HttpPeerClient::new(
            config.request_timeout(),
            config.connect_timeout(),
        ));
        Blockchain::create_blockchain(blockchain_address, config, head_store, peer_client)
    }

    /// Initial sync and conflict resolution, then the periodic sync and
    /// mining loops.
    pub fn run(self: &Arc<Self>) -> Result<NodeTasks> {
        self.sync_nodes();
        self.resolve_conflicts();

        let sync_ledger = Arc::clone(self);
        let sync_interval = self.config.node_sync_interval();
        let sync_task = PeriodicTask::spawn_after("node-sync", sync_interval, sync_interval, move || {
            sync_ledger.sync_nodes();
            sync_ledger.resolve_conflicts();
        })?;

        let tasks = NodeTasks {
            ledger: Arc::clone(self),
            sync_task: Some(sync_task),
        };
        self.start_mining()?;
        Ok(tasks)
    }

    /// Starts the periodic mining loop; the first cycle runs right away.
    /// Returns false when the loop is already running.
    pub fn start_mining(self: &Arc<Self>) -> Result<bool> {
        let mut slot = self.mining_task.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(false);
        }
        let ledger = Arc::clone(self);
        let interval = self.config.mining_interval();
        *slot = Some(PeriodicTask::spawn("mining", interval, move || {
            ledger.mining();
        })?);
        info!("Mining loop started, every {}s", interval.as_secs());
        Ok(true)
    }

    /// Stops the mining loop, waiting for a cycle in progress to finish.
    pub fn stop_mining(&self) {
        let task = self
            .mining_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.stop();
        }
    }

    pub fn is_mining(&self) -> bool {
        self.mining_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn get_blockchain_address(&self) -> &str {
        self.blockchain_address.as_str()
    }

    pub fn get_config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn get_nodes(&self) -> &Nodes {
        &self.nodes
    }

    pub fn get_head_store(&self) -> &HeadStore {
        &self.head_store
    }

    /// A copy of the whole chain.
    pub fn chain(&self) -> Vec<Block> {
        self.read_chain().clone()
    }

    pub fn len(&self) -> usize {
        self.read_chain().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_chain().is_empty()
    }

    pub fn last_block(&self) -> Block {
        self.read_chain()
            .last()
            .cloned()
            .expect("the chain always holds at least the genesis block")
    }

    pub fn transaction_pool(&self) -> Vec<Transaction> {
        self.transaction_pool.get_all()
    }

    pub fn copy_transaction_pool(&self) -> Vec<Transaction> {
        self.transaction_pool.get_all()
    }

    pub fn clear_transaction_pool(&self) {
        let _guard = self.lock_mining();
        self.transaction_pool.clear();
    }

    pub fn verify_transaction_signature(
        &self,
        public_key: &PublicKey,
        signature: &Signature,
        transaction: &Transaction,
    ) -> bool {
        transaction.verify_signature(public_key, signature)
    }

    /// Admits a transaction into the pool. Transactions from the reward
    /// sender skip every check. Anything else needs a positive amount, a
    /// public key whose address is the sender, a valid signature under that
    /// key, and a balance no smaller than the amount.
    pub fn add_transaction(
        &self,
        sender: &str,
        recipient: &str,
        token: Token,
        public_key: Option<&PublicKey>,
        signature: Option<&Signature>,
    ) -> bool {
        let _guard = self.lock_mining();
        self.add_transaction_locked(sender, recipient, token, public_key, signature)
    }

    /// Admission of a wire request, e.g. one forwarded by a peer.
    pub fn add_transaction_request(&self, request: &TransactionRequest) -> bool {
        match request.decode(&self.config.mining_sender) {
            Ok(decoded) => self.add_transaction(
                &decoded.sender,
                &decoded.recipient,
                decoded.token,
                decoded.public_key.as_ref(),
                decoded.signature.as_ref(),
            ),
            Err(e) => {
                warn!("Rejected transaction request: {e}");
                false
            }
        }
    }

    /// Admits locally, then forwards the request to every known peer.
    pub fn create_transaction(
        &self,
        sender: &str,
        recipient: &str,
        token: Token,
        public_key: Option<&PublicKey>,
        signature: Option<&Signature>,
    ) -> bool {
        let admitted = self.add_transaction(sender, recipient, token.clone(), public_key, signature);
        if !admitted {
            return false;
        }
        if let (Some(public_key), Some(signature)) = (public_key, signature) {
            let request =
                TransactionRequest::from_parts(sender, recipient, &token, public_key, signature);
            self.broadcast_transaction(&request);
        }
        true
    }

    pub fn create_transaction_request(&self, request: &TransactionRequest) -> bool {
        if !self.add_transaction_request(request) {
            return false;
        }
        self.broadcast_transaction(request);
        true
    }

    /// Appends a block sealed with `nonce` that holds the current pool, then
    /// asks every peer to clear its pool.
    pub fn create_block(&self, nonce: u64, previous_hash: Hash) -> Result<Block> {
        let block = {
            let _guard = self.lock_mining();
            let transactions = self.transaction_pool.get_all();
            self.append_block(nonce, previous_hash, transactions)?
        };
        self.broadcast_clear_pool();
        Ok(block)
    }

    /// Nonce search over a snapshot of the current pool and head.
    pub fn proof_of_work(&self) -> u64 {
        let transactions = self.transaction_pool.get_all();
        let previous_hash = self.last_block().hash();
        proof_of_work(&transactions, &previous_hash, self.config.difficulty)
    }

    /// Credits the mining reward, seals the pool into a new block and tells
    /// peers to clear their pools and re-run consensus.
    ///
    /// The block holds exactly the transactions the proof was found for; the
    /// mining lock keeps admission out until the pool has been cleared.
    /// Returns false only when the block could not be built.
    pub fn mining(&self) -> bool {
        let block = {
            let _guard = self.lock_mining();
            let reward = Token::new(&self.config.reward_token, self.config.mining_reward.clone());
            let sender = self.config.mining_sender.clone();
            let recipient = self.blockchain_address.clone();
            self.add_transaction_locked(&sender, &recipient, reward, None, None);

            let transactions = self.transaction_pool.get_all();
            let previous_hash = self.last_block().hash();
            let nonce = proof_of_work(&transactions, &previous_hash, self.config.difficulty);
            match self.append_block(nonce, previous_hash, transactions) {
                Ok(block) => block,
                Err(e) => {
                    error!("Mining failed: {e}");
                    return false;
                }
            }
        };
        info!(
            "action=mining, status=success, block={}, transactions={}",
            block.hash_hex(),
            block.get_transactions().len()
        );

        self.broadcast_clear_pool();
        self.broadcast_consensus();
        true
    }

    pub fn calculate_total_amount(&self, blockchain_address: &str, token_name: &str) -> Amount {
        balance_of(&self.read_chain(), blockchain_address, token_name)
    }

    /// Balance of every token name that appears anywhere on the chain,
    /// ordered by name.
    pub fn calculate_all_amounts(&self, blockchain_address: &str) -> Vec<Token> {
        let chain = self.read_chain();
        let mut balances: BTreeMap<String, Amount> = BTreeMap::new();
        for transaction in chain.iter().flat_map(|block| block.get_transactions()) {
            let token = transaction.get_token();
            let balance = balances.entry(token.token_name.clone()).or_default();
            if transaction.get_recipient() == blockchain_address {
                *balance = &*balance + &token.token_value;
            }
            if transaction.get_sender() == blockchain_address {
                *balance = &*balance - &token.token_value;
            }
        }
        balances
            .into_iter()
            .map(|(token_name, token_value)| Token {
                token_name,
                token_value,
            })
            .collect()
    }

    pub fn valid_chain(&self, chain: &[Block]) -> bool {
        validate_chain(chain, self.config.difficulty)
    }

    /// Adopts the longest valid chain among peers if it is strictly longer
    /// than ours. Chains are fetched without holding the mining lock; the
    /// swap re-checks the length under it.
    pub fn resolve_conflicts(&self) -> bool {
        let mut max_length = self.len();
        let mut longest_chain: Option<Vec<Block>> = None;

        for node in self.nodes.get_addrs() {
            match self.peer_client.fetch_chain(&node) {
                Ok(chain) => {
                    if chain.len() > max_length && self.valid_chain(&chain) {
                        max_length = chain.len();
                        longest_chain = Some(chain);
                    }
                }
                Err(e) => warn!("Skipping {node} during conflict resolution: {e}"),
            }
        }

        let Some(chain) = longest_chain else {
            info!("Resolve conflicts: chain not replaced");
            return false;
        };

        {
            let _guard = self.lock_mining();
            let mut local = self.write_chain();
            if chain.len() <= local.len() {
                info!("Resolve conflicts: local chain caught up, not replaced");
                return false;
            }
            *local = chain;
            drop(local);
            self.update_last_hash();
        }
        info!("Resolve conflicts: chain replaced ({max_length} blocks)");
        true
    }

    /// Replaces the peer set with whatever discovery finds right now.
    pub fn sync_nodes(&self) {
        let _guard = self.sync_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let found = self.scanner.scan(self.peer_client.as_ref());
        let dropped = self.nodes.replace_all(found);
        for node in dropped {
            info!("Peer {node} no longer reachable, dropped");
        }
        info!("Known peers: {:?}", self.nodes.get_addrs());
    }

    /// Persists the hash of the last block as the durable head.
    pub fn update_last_hash(&self) -> bool {
        let head = self.last_block().hash();
        match self.head_store.set_head(&head) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to persist head {}: {e}", encode_hash(&head));
                false
            }
        }
    }

    fn add_transaction_locked(
        &self,
        sender: &str,
        recipient: &str,
        token: Token,
        public_key: Option<&PublicKey>,
        signature: Option<&Signature>,
    ) -> bool {
        let transaction = Transaction::new(sender, recipient, token);
        if sender == self.config.mining_sender {
            self.transaction_pool.add(transaction);
            return true;
        }

        let value = &transaction.get_token().token_value;
        if value.is_negative() || value.is_zero() {
            warn!("Rejected transaction from {sender}: amount {value} is not positive");
            return false;
        }

        let (Some(public_key), Some(signature)) = (public_key, signature) else {
            warn!("Rejected transaction from {sender}: missing public key or signature");
            return false;
        };
        if convert_address(&hash_pub_key(public_key.as_bytes())) != sender {
            warn!("Rejected transaction from {sender}: public key does not own the sender address");
            return false;
        }
        if !self.verify_transaction_signature(public_key, signature, &transaction) {
            warn!("Rejected transaction from {sender}: signature verification failed");
            return false;
        }

        let token_name = &transaction.get_token().token_name;
        let balance = self.calculate_total_amount(sender, token_name);
        if &balance < value {
            warn!("Rejected transaction from {sender}: balance {balance} {token_name} is less than {value}");
            return false;
        }

        self.transaction_pool.add(transaction);
        true
    }

    // Caller holds the mining lock. A failed head write is logged and the
    // block is kept.
    fn append_block(
        &self,
        nonce: u64,
        previous_hash: Hash,
        transactions: Vec<Transaction>,
    ) -> Result<Block> {
        let block = Block::new_block(nonce, previous_hash, transactions)?;
        self.write_chain().push(block.clone());
        self.transaction_pool.clear();
        self.update_last_hash();
        Ok(block)
    }

    fn broadcast_transaction(&self, request: &TransactionRequest) {
        for node in self.nodes.get_addrs() {
            if let Err(e) = self.peer_client.forward_transaction(&node, request) {
                warn!("Failed to forward transaction to {node}: {e}");
            }
        }
    }

    fn broadcast_clear_pool(&self) {
        for node in self.nodes.get_addrs() {
            if let Err(e) = self.peer_client.request_clear_pool(&node) {
                warn!("Failed to clear transaction pool on {node}: {e}");
            }
        }
    }

    fn broadcast_consensus(&self) {
        for node in self.nodes.get_addrs() {
            if let Err(e) = self.peer_client.request_consensus(&node) {
                warn!("Failed to request consensus from {node}: {e}");
            }
        }
    }

    fn lock_mining(&self) -> MutexGuard<'_, ()> {
        self.mining_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_chain(&self) -> RwLockReadGuard<'_, Vec<Block>> {
        self.chain.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_chain(&self) -> RwLockWriteGuard<'_, Vec<Block>> {
        self.chain.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Net balance: every credit minus every debit of `token_name` to or from
/// `blockchain_address`, over the whole chain.
pub fn balance_of(chain: &[Block], blockchain_address: &str, token_name: &str) -> Amount {
    let mut total = Amount::zero();
    for transaction in chain.iter().flat_map(|block| block.get_transactions()) {
        let token = transaction.get_token();
        if token.token_name != token_name {
            continue;
        }
        if transaction.get_recipient() == blockchain_address {
            total = &total + &token.token_value;
        }
        if transaction.get_sender() == blockchain_address {
            total = &total - &token.token_value;
        }
    }
    total
}

/// Every block after the first must link to its predecessor's hash and carry
/// a proof meeting `difficulty`. The first block is taken as given. An empty
/// chain is invalid.
pub fn validate_chain(chain: &[Block], difficulty: usize) -> bool {
    if chain.is_empty() {
        return false;
    }
    chain.windows(2).all(|pair| {
        let (previous, block) = (&pair[0], &pair[1]);
        *block.get_previous_hash() == previous.hash() && ProofOfWork::validate(block, difficulty)
    })
}
