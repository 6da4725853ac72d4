//! Multi-signature engine: sub-range digests, block signing and the
//! input-spend authorization rule.
//!
//! A signer commits to the block as it looked when the pen hit the paper:
//! every field before the signature's own slot, plus the non-signature
//! fields after it. Signature slots past the cut are zeroed in the digest
//! so that later signers (and the mining nonce, which is tagged as a
//! signature slot) can land without invalidating earlier signatures.

use crate::block::{Block, InSig};
use crate::errors::BlockResult;
use crate::field::FieldType;
use crate::raw::{field_type_at, XdagBlock};
use crate::wallet::{verify, Signer};
use crate::{XDAG_BLOCK_FIELDS, XDAG_BLOCK_SIZE, XDAG_FIELD_SIZE};
use secp256k1::PublicKey;
use xdag_hashes::{hash_twice_concat, Hash};

/// The signed byte view for a signature written at field offset `cut`:
/// fields `[0, cut)` verbatim, fields `[cut, 16)` kept only when their
/// type-word nibble is not a signature tag, zeroed otherwise.
pub fn sub_raw_data(raw: &XdagBlock, cut: usize) -> [u8; XDAG_BLOCK_SIZE] {
    let cut = cut.min(XDAG_BLOCK_FIELDS);
    let mut out = [0u8; XDAG_BLOCK_SIZE];
    out[..cut * XDAG_FIELD_SIZE].copy_from_slice(&raw.data()[..cut * XDAG_FIELD_SIZE]);
    for i in cut..XDAG_BLOCK_FIELDS {
        if !raw.field_type(i).is_signature() {
            let start = i * XDAG_FIELD_SIZE;
            out[start..start + XDAG_FIELD_SIZE].copy_from_slice(&raw.data()[start..start + XDAG_FIELD_SIZE]);
        }
    }
    out
}

/// Field offset of the first sign-out nibble in `type_word`, or 16 when
/// the block carries no output signature.
pub fn outsig_index(type_word: u64) -> usize {
    (0..XDAG_BLOCK_FIELDS).find(|&i| field_type_at(type_word, i) == FieldType::SignOut).unwrap_or(XDAG_BLOCK_FIELDS)
}

impl Block {
    /// Signs the block as an input spender. The cut records how many
    /// fields were already occupied, which is exactly where this
    /// signature pair will land on the next encode.
    pub fn sign_in(&mut self, signer: &impl Signer) -> BlockResult<()> {
        let cut = self.encoded_len() as u8;
        let digest = hash_twice_concat(self.encode()?.data(), &signer.public_key().serialize());
        let signature = signer.sign(digest);
        self.in_sigs.push(InSig { signature, cut });
        self.invalidate();
        Ok(())
    }

    /// Signs the block as its owner. At most one output signature exists;
    /// signing again replaces it.
    pub fn sign_out(&mut self, signer: &impl Signer) -> BlockResult<()> {
        let digest = hash_twice_concat(self.encode()?.data(), &signer.public_key().serialize());
        self.out_sig = Some(signer.sign(digest));
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        self.raw = None;
        self.info.hash = Hash::ZERO;
        self.info.hash_low = Hash::ZERO;
    }

    /// Every declared public key that verifies at least one of the
    /// block's signatures, in declaration order. A key verifying several
    /// signatures appears once per signature it matches.
    pub fn verified_keys(&self) -> BlockResult<Vec<PublicKey>> {
        let raw = self.xdag_block()?;
        let mut keys = Vec::new();

        for in_sig in &self.in_sigs {
            let sub = sub_raw_data(&raw, in_sig.cut as usize);
            for key in &self.pub_keys {
                let digest = hash_twice_concat(&sub, &key.serialize());
                if verify(key, digest, &in_sig.signature) {
                    keys.push(*key);
                }
            }
        }
        if let Some(out_sig) = &self.out_sig {
            let sub = sub_raw_data(&raw, outsig_index(self.type_word()));
            for key in &self.pub_keys {
                let digest = hash_twice_concat(&sub, &key.serialize());
                if verify(key, digest, out_sig) {
                    keys.push(*key);
                }
            }
        }
        Ok(keys)
    }
}

/// Spend authorization: for every input block, some key proven by the
/// transaction's own signatures must also verify that input's output
/// signature. A transaction with no verified keys can spend nothing;
/// an input with no output signature can never be spent.
pub fn can_use_input(tx: &Block, inputs: &[&Block]) -> BlockResult<bool> {
    let keys = tx.verified_keys()?;
    'inputs: for input in inputs {
        let Some(out_sig) = input.out_sig() else {
            return Ok(false);
        };
        let raw = input.xdag_block()?;
        let sub = sub_raw_data(&raw, outsig_index(input.type_word()));
        for key in &keys {
            let digest = hash_twice_concat(&sub, &key.serialize());
            if verify(key, digest, out_sig) {
                continue 'inputs;
            }
        }
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::block::BlockBuilder;
    use crate::field::FieldType;
    use crate::network::NetworkType;
    use secp256k1::{generate_keypair, SecretKey};

    fn keypair() -> (SecretKey, PublicKey) {
        generate_keypair(&mut rand::thread_rng())
    }

    /// An owned block: one declared key, sign-out by that key.
    fn address_block(secret: &SecretKey, public: PublicKey) -> Block {
        let mut block =
            BlockBuilder::new(NetworkType::Devnet, 0x17e9_0000_0000).key(public).default_key(0).build().unwrap();
        block.sign_out(secret).unwrap();
        block.seal().unwrap();
        block
    }

    #[test]
    fn test_sub_raw_data_zeroes_later_signatures() {
        let (secret, public) = keypair();
        let block = address_block(&secret, public);
        let raw = block.xdag_block().unwrap();
        let cut = outsig_index(block.type_word());
        assert_eq!(cut, 2); // header, key, then the sign-out pair

        let sub = sub_raw_data(&raw, cut);
        // everything before the cut is verbatim
        assert_eq!(&sub[..cut * 32], &raw.data()[..cut * 32]);
        // the signature pair itself is zeroed
        assert_eq!(&sub[cut * 32..(cut + 2) * 32], &[0u8; 64]);
    }

    #[test]
    fn test_sign_out_verifies() {
        let (secret, public) = keypair();
        let block = address_block(&secret, public);
        assert_eq!(block.verified_keys().unwrap(), vec![public]);
    }

    #[test]
    fn test_flipped_signature_fails() {
        let (secret, public) = keypair();
        let block = address_block(&secret, public);
        let mut data = *block.xdag_block().unwrap().data();
        // corrupt one bit of the signature's s half
        data[3 * 32] ^= 0x01;
        let tampered = Block::from_xdag(XdagBlock::new(data)).unwrap();
        assert!(tampered.verified_keys().unwrap().is_empty());
    }

    #[test]
    fn test_sign_in_survives_later_sign_out() {
        // two keys: key 0 signs in, key 1 owns the block
        let (secret0, public0) = keypair();
        let (secret1, public1) = keypair();
        let mut block = BlockBuilder::new(NetworkType::Devnet, 0x17e9_0000_0000)
            .key(public0)
            .key(public1)
            .default_key(1)
            .build()
            .unwrap();
        block.sign_in(&secret0).unwrap();
        block.sign_out(&secret1).unwrap();
        block.seal().unwrap();

        // the cut equals the occupied length before the in-signature landed
        assert_eq!(block.in_sigs()[0].cut, 3);
        let keys = block.verified_keys().unwrap();
        assert_eq!(keys, vec![public0, public1]);
    }

    #[test]
    fn test_default_key_declared_first_still_verifies() {
        // owner key declared before the co-signer: the sign-out pair is
        // still scheduled last, after every sign-in pair
        let (secret0, public0) = keypair();
        let (secret1, public1) = keypair();
        let mut block = BlockBuilder::new(NetworkType::Devnet, 0x17e9_0000_0000)
            .key(public0)
            .key(public1)
            .default_key(0)
            .build()
            .unwrap();
        assert_eq!(field_type_at(block.type_word(), 3), FieldType::SignIn);
        assert_eq!(field_type_at(block.type_word(), 4), FieldType::SignIn);
        assert_eq!(field_type_at(block.type_word(), 5), FieldType::SignOut);
        assert_eq!(field_type_at(block.type_word(), 6), FieldType::SignOut);

        block.sign_in(&secret1).unwrap();
        block.sign_out(&secret0).unwrap();
        block.seal().unwrap();
        assert_eq!(block.verified_keys().unwrap(), vec![public1, public0]);

        let reparsed = Block::from_xdag(block.xdag_block().unwrap()).unwrap();
        assert_eq!(reparsed.in_sigs(), block.in_sigs());
        assert_eq!(reparsed.out_sig(), block.out_sig());
        assert_eq!(reparsed.verified_keys().unwrap(), vec![public1, public0]);
    }

    #[test]
    fn test_verification_survives_round_trip() {
        let (secret, public) = keypair();
        let block = address_block(&secret, public);
        let reparsed = Block::from_xdag(block.xdag_block().unwrap()).unwrap();
        assert_eq!(reparsed.verified_keys().unwrap(), vec![public]);
    }

    #[test]
    fn test_mining_nonce_outside_signed_range() {
        let (secret, public) = keypair();
        let mut block = BlockBuilder::new(NetworkType::Devnet, 0x17e9_0000_0000)
            .key(public)
            .default_key(0)
            .mining(true)
            .build()
            .unwrap();
        block.sign_out(&secret).unwrap();
        block.seal().unwrap();
        assert_eq!(block.verified_keys().unwrap(), vec![public]);

        // grinding the nonce must not break the owner's signature
        block.set_nonce(crate::field::Field([0x5au8; 32]));
        block.recalc_hash().unwrap();
        assert_eq!(block.verified_keys().unwrap(), vec![public]);
    }

    #[test]
    fn test_foreign_owner_spends_with_in_signature() {
        let (key1, key1_pub) = keypair();
        let (key2, key2_pub) = keypair();
        let coin = address_block(&key1, key1_pub);
        let link = Address::from_amount(coin.hash_low(), FieldType::In, 1).unwrap();

        // owned by key2 alone: no proven key matches the coin's out-signature
        let mut plain = BlockBuilder::new(NetworkType::Devnet, 0x17e9_0000_1000)
            .link(link)
            .key(key2_pub)
            .default_key(0)
            .build()
            .unwrap();
        plain.sign_out(&key2).unwrap();
        plain.seal().unwrap();
        assert!(!can_use_input(&plain, &[&coin]).unwrap());

        // same block shape, but key1 also signs in: now authorized
        let mut endorsed = BlockBuilder::new(NetworkType::Devnet, 0x17e9_0000_1000)
            .link(link)
            .key(key1_pub)
            .key(key2_pub)
            .default_key(1)
            .build()
            .unwrap();
        endorsed.sign_in(&key1).unwrap();
        endorsed.sign_out(&key2).unwrap();
        endorsed.seal().unwrap();
        assert!(can_use_input(&endorsed, &[&coin]).unwrap());
    }

    #[test]
    fn test_can_use_input() {
        let (alice, alice_pub) = keypair();
        let (bob, bob_pub) = keypair();

        // two coins owned by alice, one by bob
        let coin_a = address_block(&alice, alice_pub);
        let coin_b = address_block(&alice, alice_pub);
        let coin_c = address_block(&bob, bob_pub);

        let spend = |secret: &SecretKey, public: PublicKey, coins: &[&Block]| -> Block {
            let mut builder = BlockBuilder::new(NetworkType::Devnet, 0x17e9_0000_1000).key(public).default_key(0);
            for coin in coins {
                builder =
                    builder.link(Address::from_amount(coin.hash_low(), FieldType::In, 1).unwrap());
            }
            let mut tx = builder.build().unwrap();
            tx.sign_out(secret).unwrap();
            tx.seal().unwrap();
            tx
        };

        // alice can spend her own coins
        let tx = spend(&alice, alice_pub, &[&coin_a, &coin_b]);
        assert!(can_use_input(&tx, &[&coin_a, &coin_b]).unwrap());

        // but not bob's, even alongside her own
        assert!(!can_use_input(&tx, &[&coin_a, &coin_c]).unwrap());
        let tx = spend(&alice, alice_pub, &[&coin_c]);
        assert!(!can_use_input(&tx, &[&coin_c]).unwrap());

        // a transaction with no verified keys spends nothing
        let mut unsigned =
            BlockBuilder::new(NetworkType::Devnet, 0x17e9_0000_1000).key(alice_pub).default_key(0).build().unwrap();
        unsigned.seal().unwrap();
        assert!(!can_use_input(&unsigned, &[&coin_a]).unwrap());

        // and an input without an output signature is unspendable
        let mut bare = BlockBuilder::new(NetworkType::Devnet, 0x17e9_0000_0000).key(alice_pub).default_key(0).build().unwrap();
        bare.seal().unwrap();
        let tx = spend(&alice, alice_pub, &[&bare]);
        assert!(!can_use_input(&tx, &[&bare]).unwrap());
    }
}
