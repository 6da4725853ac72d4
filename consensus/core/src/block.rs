use crate::address::Address;
use crate::errors::{BlockError, BlockResult};
use crate::field::{Field, FieldType};
use crate::info::BlockInfo;
use crate::network::NetworkType;
use crate::raw::XdagBlock;
use crate::{Signature, MAX_LINKS, XDAG_BLOCK_FIELDS, XDAG_BLOCK_SIZE, XDAG_FIELD_SIZE};
use secp256k1::PublicKey;
use xdag_hashes::{hash_twice, Hash};

/// An input signature half-pair together with the field offset at which it
/// was (or will be) written. The offset is the sub-range cut the signer
/// hashed over, and is what lets verification reconstruct the exact digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InSig {
    pub signature: Signature,
    pub cut: u8,
}

/// A runtime block: decoded links, keys and signatures, plus the cached
/// canonical 512-byte form and its hash.
///
/// The cached raw form is immutable once hashed; mining flows that mutate
/// the nonce must call [`Block::recalc_hash`] explicitly.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) info: BlockInfo,
    pub(crate) transport_header: u64,
    pub(crate) inputs: Vec<Address>,
    pub(crate) outputs: Vec<Address>,
    pub(crate) pub_keys: Vec<PublicKey>,
    pub(crate) in_sigs: Vec<InSig>,
    pub(crate) out_sig: Option<Signature>,
    pub(crate) nonce: Field,
    pub(crate) raw: Option<XdagBlock>,
}

impl Block {
    /// Parses a canonical 512-byte block: splits links, keys and
    /// signatures out of the field array and computes the content hash.
    pub fn from_xdag(xdag: XdagBlock) -> BlockResult<Block> {
        let hash = hash_twice(xdag.data());
        let mut info = BlockInfo {
            type_word: xdag.type_word(),
            timestamp: xdag.timestamp(),
            fee: xdag.fee(),
            hash,
            hash_low: hash.low(),
            ..Default::default()
        };

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut pub_keys = Vec::new();
        let mut in_sigs = Vec::new();
        let mut out_sig = None;
        let mut nonce = Field::ZERO;
        let mut first_sig_index = None;

        for i in 0..XDAG_BLOCK_FIELDS {
            let field = xdag.field(i);
            let field_type = xdag.field_type(i);
            match field_type {
                FieldType::In => inputs.push(Address::from_field(&field, FieldType::In)),
                FieldType::Out => outputs.push(Address::from_field(&field, FieldType::Out)),
                FieldType::Remark => info.remark = Some(field),
                FieldType::PublicKeyEven | FieldType::PublicKeyOdd => {
                    let mut compressed = [0u8; 33];
                    compressed[0] = if field_type == FieldType::PublicKeyEven { 0x02 } else { 0x03 };
                    compressed[1..].copy_from_slice(&field.0);
                    let key = PublicKey::from_slice(&compressed).map_err(BlockError::BadPublicKey)?;
                    pub_keys.push(key);
                }
                FieldType::SignIn | FieldType::SignOut => {
                    let first = *first_sig_index.get_or_insert(i);
                    if (i - first) % 2 == 0 && i + 1 < XDAG_BLOCK_FIELDS {
                        let mut signature = [0u8; 64];
                        signature[..32].copy_from_slice(&field.0);
                        signature[32..].copy_from_slice(&xdag.field(i + 1).0);
                        if field_type == FieldType::SignIn {
                            in_sigs.push(InSig { signature, cut: i as u8 });
                        } else {
                            out_sig = Some(signature);
                        }
                    }
                    // a sign-in tag at the last slot marks the mining nonce
                    if i == MAX_LINKS && field_type == FieldType::SignIn {
                        nonce = field;
                    }
                }
                _ => {}
            }
        }

        Ok(Block {
            info,
            transport_header: xdag.transport_header(),
            inputs,
            outputs,
            pub_keys,
            in_sigs,
            out_sig,
            nonce,
            raw: Some(xdag),
        })
    }

    /// Reconstructs a metadata-only block from persisted `BlockInfo`;
    /// links, keys and signatures are absent until the raw bytes are
    /// fetched and re-parsed.
    pub fn from_info(info: BlockInfo) -> Block {
        Block {
            info,
            transport_header: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
            pub_keys: Vec::new(),
            in_sigs: Vec::new(),
            out_sig: None,
            nonce: Field::ZERO,
            raw: None,
        }
    }

    /// Number of fields the canonical encoding occupies before padding.
    pub fn encoded_len(&self) -> usize {
        1 + self.inputs.len()
            + self.outputs.len()
            + usize::from(self.info.remark.is_some())
            + self.pub_keys.len()
            + 2 * self.in_sigs.len()
            + if self.out_sig.is_some() { 2 } else { 0 }
    }

    /// Serializes the canonical 512-byte form from the decoded state.
    /// Inputs are written before outputs; remaining slots up to 14 are
    /// zero-padded and slot 15 always holds the (possibly zero) nonce.
    pub fn encode(&self) -> BlockResult<XdagBlock> {
        let len = self.encoded_len();
        if len > XDAG_BLOCK_FIELDS {
            return Err(BlockError::Overflow(len));
        }

        let mut data = [0u8; XDAG_BLOCK_SIZE];
        // transport header is an opaque passthrough, always zero on encode
        data[8..16].copy_from_slice(&self.info.type_word.to_le_bytes());
        data[16..24].copy_from_slice(&self.info.timestamp.to_le_bytes());
        data[24..32].copy_from_slice(&self.info.fee.to_le_bytes());

        let mut pos = 1;
        let mut write_field = |pos: &mut usize, bytes: &[u8]| {
            data[*pos * XDAG_FIELD_SIZE..*pos * XDAG_FIELD_SIZE + bytes.len()].copy_from_slice(bytes);
            *pos += 1;
        };

        for link in self.inputs.iter().chain(self.outputs.iter()) {
            write_field(&mut pos, &link.to_field().0);
        }
        if let Some(remark) = &self.info.remark {
            write_field(&mut pos, &remark.0);
        }
        for key in &self.pub_keys {
            // the parity byte lives in the type word, only X goes on the wire
            write_field(&mut pos, &key.serialize()[1..33]);
        }
        for in_sig in &self.in_sigs {
            write_field(&mut pos, &in_sig.signature[..32]);
            write_field(&mut pos, &in_sig.signature[32..]);
        }
        if let Some(out_sig) = &self.out_sig {
            write_field(&mut pos, &out_sig[..32]);
            write_field(&mut pos, &out_sig[32..]);
        }

        if pos < XDAG_BLOCK_FIELDS {
            data[MAX_LINKS * XDAG_FIELD_SIZE..].copy_from_slice(&self.nonce.0);
        }
        Ok(XdagBlock::new(data))
    }

    /// The cached canonical form, or a fresh encoding when none is cached.
    pub fn xdag_block(&self) -> BlockResult<XdagBlock> {
        match self.raw {
            Some(raw) => Ok(raw),
            None => self.encode(),
        }
    }

    /// Encodes and hashes, caching both. Idempotent once cached.
    pub fn seal(&mut self) -> BlockResult<Hash> {
        let raw = match self.raw {
            Some(raw) => raw,
            None => {
                let raw = self.encode()?;
                self.raw = Some(raw);
                raw
            }
        };
        if self.info.hash.is_zero() {
            self.info.hash = hash_twice(raw.data());
            self.info.hash_low = self.info.hash.low();
        }
        Ok(self.info.hash)
    }

    /// Re-encodes and rehashes unconditionally. Mining flows mutate the
    /// nonce after an initial hash and must call this to refresh identity.
    pub fn recalc_hash(&mut self) -> BlockResult<Hash> {
        let raw = self.encode()?;
        self.raw = Some(raw);
        self.info.hash = hash_twice(raw.data());
        self.info.hash_low = self.info.hash.low();
        Ok(self.info.hash)
    }

    /// Cached hash; zero until sealed.
    pub fn hash(&self) -> Hash {
        self.info.hash
    }

    /// Cached low hash; zero until sealed.
    pub fn hash_low(&self) -> Hash {
        self.info.hash_low
    }

    pub fn info(&self) -> &BlockInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut BlockInfo {
        &mut self.info
    }

    pub fn timestamp(&self) -> u64 {
        self.info.timestamp
    }

    /// Transport word as received; zero for locally built blocks.
    pub fn transport_header(&self) -> u64 {
        self.transport_header
    }

    pub fn type_word(&self) -> u64 {
        self.info.type_word
    }

    pub fn fee(&self) -> u64 {
        self.info.fee
    }

    pub fn inputs(&self) -> &[Address] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Address] {
        &self.outputs
    }

    /// All links in canonical (inputs then outputs) order.
    pub fn links(&self) -> impl Iterator<Item = &Address> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    pub fn pub_keys(&self) -> &[PublicKey] {
        &self.pub_keys
    }

    pub fn in_sigs(&self) -> &[InSig] {
        &self.in_sigs
    }

    pub fn out_sig(&self) -> Option<&Signature> {
        self.out_sig.as_ref()
    }

    pub fn nonce(&self) -> &Field {
        &self.nonce
    }

    /// Replaces the mining nonce and drops the raw cache. The cached hash
    /// intentionally stays stale until `recalc_hash`.
    pub fn set_nonce(&mut self, nonce: Field) {
        self.nonce = nonce;
        self.raw = None;
    }
}

/// Append-only assembly of a new block. Slots are scheduled in strict
/// order (header, links, pending outputs, remark, keys, signature
/// placeholders, mining marker) and the 64-bit type word is derived from
/// that schedule only when the block is built, never mutated afterwards.
pub struct BlockBuilder {
    network: NetworkType,
    timestamp: u64,
    fee: u64,
    links: Vec<Address>,
    pending: Vec<Address>,
    remark: Option<String>,
    keys: Vec<PublicKey>,
    default_key: Option<usize>,
    mining: bool,
}

impl BlockBuilder {
    pub fn new(network: NetworkType, timestamp: u64) -> Self {
        Self {
            network,
            timestamp,
            fee: 0,
            links: Vec::new(),
            pending: Vec::new(),
            remark: None,
            keys: Vec::new(),
            default_key: None,
            mining: false,
        }
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn link(mut self, address: Address) -> Self {
        self.links.push(address);
        self
    }

    pub fn links(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.links.extend(addresses);
        self
    }

    /// Orphan addresses to reference as pending outputs.
    pub fn pending(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.pending.extend(addresses);
        self
    }

    pub fn remark(mut self, remark: &str) -> Self {
        self.remark = Some(remark.to_string());
        self
    }

    pub fn key(mut self, key: PublicKey) -> Self {
        self.keys.push(key);
        self
    }

    /// Marks which declared key signs out (owns the block); the others
    /// get sign-in placeholders, scheduled before the sign-out pair
    /// regardless of declaration order. Without a default key the block
    /// still ends with one sign-out pair.
    pub fn default_key(mut self, index: usize) -> Self {
        self.default_key = Some(index);
        self
    }

    /// Reserves slot 15 for the mining nonce, tagged so sub-range digests
    /// exclude it and the nonce can change without breaking signatures.
    pub fn mining(mut self, mining: bool) -> Self {
        self.mining = mining;
        self
    }

    pub fn build(self) -> BlockResult<Block> {
        let mut schedule: Vec<(usize, FieldType)> = vec![(0, self.network.header_field_type())];
        let mut slot = 1;
        let mut append = |schedule: &mut Vec<(usize, FieldType)>, field_type: FieldType| {
            schedule.push((slot, field_type));
            slot += 1;
        };

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for link in self.links {
            append(&mut schedule, link.field_type());
            if link.field_type() == FieldType::Out {
                outputs.push(link);
            } else {
                inputs.push(link);
            }
        }
        for address in self.pending {
            append(&mut schedule, FieldType::Out);
            outputs.push(Address::from_amount(address.hash_low(), FieldType::Out, address.amount())?);
        }

        let remark = match self.remark.as_deref().map(str::trim) {
            None => None,
            Some(trimmed) => {
                if trimmed.is_empty() || trimmed.len() > XDAG_FIELD_SIZE || !trimmed.bytes().all(|b| (0x20..0x7f).contains(&b)) {
                    return Err(BlockError::BadRemark);
                }
                append(&mut schedule, FieldType::Remark);
                let mut field = Field::ZERO;
                field.0[..trimmed.len()].copy_from_slice(trimmed.as_bytes());
                Some(field)
            }
        };

        for key in &self.keys {
            let field_type = if key.serialize()[0] == 0x02 { FieldType::PublicKeyEven } else { FieldType::PublicKeyOdd };
            append(&mut schedule, field_type);
        }

        // sign-in pairs first, the single sign-out pair last; the encoder
        // writes signatures in that same order, so the slot tags and the
        // bytes can never disagree
        for i in 0..self.keys.len() {
            if self.default_key != Some(i) {
                append(&mut schedule, FieldType::SignIn);
                append(&mut schedule, FieldType::SignIn);
            }
        }
        append(&mut schedule, FieldType::SignOut);
        append(&mut schedule, FieldType::SignOut);

        if slot > XDAG_BLOCK_FIELDS || (self.mining && slot > MAX_LINKS) {
            return Err(BlockError::Overflow(slot));
        }
        if self.mining {
            schedule.push((MAX_LINKS, FieldType::SignIn));
        }

        // the type word is a pure serialization of the slot schedule
        let type_word =
            schedule.iter().fold(0u64, |word, (slot, field_type)| word | ((field_type.nibble() as u64) << (slot * 4)));

        let info = BlockInfo { type_word, timestamp: self.timestamp, fee: self.fee, remark, ..Default::default() };
        Ok(Block {
            info,
            transport_header: 0,
            inputs,
            outputs,
            pub_keys: self.keys,
            in_sigs: Vec::new(),
            out_sig: None,
            nonce: Field::ZERO,
            raw: None,
        })
    }
}
