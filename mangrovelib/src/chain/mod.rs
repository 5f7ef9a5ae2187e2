// Copyright (C) 2024-2026 Mangrove Labs
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::io::{Read, Write};
use std::{error, fmt};

use mangrove_common::codec::{
    read_next, read_next_at_most, write_next, Error as codec_error, WireCodec,
};
use mangrove_common::types::{AccountId, BlockId, BlsSignatureBuffer, MessageId, MessageSignature};
use mangrove_common::util::hash::{Sha256Sum, Sha512Trunc256Sum};

/// Most blocks a single tipset may carry. Decode-time bound, not a
/// consensus rule.
pub const MAX_TIPSET_BLOCKS: u32 = 64;

/// Most bytes a single message payload may carry on the wire.
pub const MAX_MESSAGE_PAYLOAD: u32 = 64 * 1024;

#[derive(Debug, PartialEq)]
pub enum Error {
    /// A tipset must have at least one block
    EmptyTipset,
    /// Blocks in a tipset disagree on their epoch
    EpochMismatch(u64, u64),
    /// Blocks in a tipset disagree on their parent tipset
    ParentsMismatch,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::EmptyTipset => write!(f, "tipset has no blocks"),
            Error::EpochMismatch(expected, got) => {
                write!(f, "tipset blocks at different epochs ({expected} != {got})")
            }
            Error::ParentsMismatch => write!(f, "tipset blocks have different parents"),
        }
    }
}

impl error::Error for Error {
    fn cause(&self) -> Option<&dyn error::Error> {
        None
    }
}

/// Canonical identifier of a tipset: the ids of its blocks, in block
/// order. Two keys are the same tipset only if the ids *and* their
/// order match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TipsetKey(pub Vec<BlockId>);

impl TipsetKey {
    pub fn new(ids: Vec<BlockId>) -> TipsetKey {
        TipsetKey(ids)
    }

    pub fn block_ids(&self) -> &[BlockId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TipsetKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "}}")
    }
}

impl WireCodec for TipsetKey {
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.0)
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<TipsetKey, codec_error> {
        let ids: Vec<BlockId> = read_next_at_most(fd, MAX_TIPSET_BLOCKS)?;
        Ok(TipsetKey(ids))
    }
}

/// A block header. Messages are committed to by `messages_root` and
/// shipped separately; the header alone is what tipsets are built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// tipset this block builds on
    pub parents: TipsetKey,
    /// chain height, counted from genesis
    pub epoch: u64,
    /// total weight of the chain ending in this block
    pub weight: u64,
    /// account that mined this block
    pub miner: AccountId,
    /// state tree after applying the parent tipset's messages
    pub state_root: Sha256Sum,
    /// commitment to this block's message lists
    pub messages_root: Sha256Sum,
    /// seconds since the epoch
    pub timestamp: u64,
    /// aggregate over this block's bls-scheme messages
    pub bls_aggregate: BlsSignatureBuffer,
}

impl BlockHeader {
    /// The header's content id: the hash of its canonical encoding.
    pub fn block_id(&self) -> BlockId {
        let bytes = self.serialize_to_vec();
        BlockId(Sha512Trunc256Sum::from_data(&bytes).0)
    }
}

impl WireCodec for BlockHeader {
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.parents)?;
        write_next(fd, &self.epoch)?;
        write_next(fd, &self.weight)?;
        write_next(fd, &self.miner)?;
        write_next(fd, &self.state_root)?;
        write_next(fd, &self.messages_root)?;
        write_next(fd, &self.timestamp)?;
        write_next(fd, &self.bls_aggregate)?;
        Ok(())
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<BlockHeader, codec_error> {
        let parents: TipsetKey = read_next(fd)?;
        let epoch: u64 = read_next(fd)?;
        let weight: u64 = read_next(fd)?;
        let miner: AccountId = read_next(fd)?;
        let state_root: Sha256Sum = read_next(fd)?;
        let messages_root: Sha256Sum = read_next(fd)?;
        let timestamp: u64 = read_next(fd)?;
        let bls_aggregate: BlsSignatureBuffer = read_next(fd)?;
        Ok(BlockHeader {
            parents,
            epoch,
            weight,
            miner,
            state_root,
            messages_root,
            timestamp,
            bls_aggregate,
        })
    }
}

/// A message authenticated by the block's aggregate bls signature.
/// Carries no signature of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedMessage {
    pub from: AccountId,
    pub to: AccountId,
    /// sender's sequence number
    pub nonce: u64,
    /// token amount transferred
    pub amount: u64,
    /// opaque call data
    pub payload: Vec<u8>,
}

impl UnsignedMessage {
    /// Content id of this message; the dedup key in compacted encodings.
    pub fn message_id(&self) -> MessageId {
        let bytes = self.serialize_to_vec();
        MessageId(Sha512Trunc256Sum::from_data(&bytes).0)
    }
}

impl WireCodec for UnsignedMessage {
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.from)?;
        write_next(fd, &self.to)?;
        write_next(fd, &self.nonce)?;
        write_next(fd, &self.amount)?;
        write_next(fd, &self.payload)?;
        Ok(())
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<UnsignedMessage, codec_error> {
        let from: AccountId = read_next(fd)?;
        let to: AccountId = read_next(fd)?;
        let nonce: u64 = read_next(fd)?;
        let amount: u64 = read_next(fd)?;
        let payload: Vec<u8> = read_next_at_most(fd, MAX_MESSAGE_PAYLOAD)?;
        Ok(UnsignedMessage {
            from,
            to,
            nonce,
            amount,
            payload,
        })
    }
}

/// A message carrying its own secp256k1 signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedMessage {
    pub message: UnsignedMessage,
    pub signature: MessageSignature,
}

impl SignedMessage {
    /// Content id over the signed encoding, so the same payload under
    /// two signatures is two distinct messages.
    pub fn message_id(&self) -> MessageId {
        let bytes = self.serialize_to_vec();
        MessageId(Sha512Trunc256Sum::from_data(&bytes).0)
    }
}

impl WireCodec for SignedMessage {
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.message)?;
        write_next(fd, &self.signature)?;
        Ok(())
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<SignedMessage, codec_error> {
        let message: UnsignedMessage = read_next(fd)?;
        let signature: MessageSignature = read_next(fd)?;
        Ok(SignedMessage { message, signature })
    }
}

/// Check that a set of headers can form a tipset: non-empty, one epoch,
/// one parent key.
fn check_tipset_headers<'a>(mut headers: impl Iterator<Item = &'a BlockHeader>) -> Result<(), Error> {
    let first = headers.next().ok_or(Error::EmptyTipset)?;
    for header in headers {
        if header.epoch != first.epoch {
            return Err(Error::EpochMismatch(first.epoch, header.epoch));
        }
        if header.parents != first.parents {
            return Err(Error::ParentsMismatch);
        }
    }
    Ok(())
}

/// A set of sibling blocks at one epoch, sharing the same parents.
/// Only constructible through `new`, so holders can rely on the
/// invariants without re-checking.
#[derive(Debug, Clone, PartialEq)]
pub struct Tipset {
    blocks: Vec<BlockHeader>,
}

impl Tipset {
    pub fn new(blocks: Vec<BlockHeader>) -> Result<Tipset, Error> {
        check_tipset_headers(blocks.iter())?;
        Ok(Tipset { blocks })
    }

    pub fn blocks(&self) -> &[BlockHeader] {
        &self.blocks
    }

    /// Block ids in block order. The index of an id here is the block
    /// index used by compacted-message include lists.
    pub fn key(&self) -> TipsetKey {
        TipsetKey(self.blocks.iter().map(|blk| blk.block_id()).collect())
    }

    pub fn epoch(&self) -> u64 {
        self.blocks[0].epoch
    }

    pub fn parents(&self) -> &TipsetKey {
        &self.blocks[0].parents
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A block header together with its materialized message lists, in the
/// order the block declared them.
#[derive(Debug, Clone, PartialEq)]
pub struct FullBlock {
    pub header: BlockHeader,
    pub bls_messages: Vec<UnsignedMessage>,
    pub secp_messages: Vec<SignedMessage>,
}

/// A tipset whose blocks carry their full message lists. The terminal
/// artifact of a chain-exchange fetch; handed off to the sync machinery.
#[derive(Debug, Clone, PartialEq)]
pub struct FullTipset {
    blocks: Vec<FullBlock>,
}

impl FullTipset {
    pub fn new(blocks: Vec<FullBlock>) -> Result<FullTipset, Error> {
        check_tipset_headers(blocks.iter().map(|blk| &blk.header))?;
        Ok(FullTipset { blocks })
    }

    pub fn blocks(&self) -> &[FullBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<FullBlock> {
        self.blocks
    }

    /// Project the headers back out as a plain tipset.
    pub fn tipset(&self) -> Tipset {
        Tipset {
            blocks: self.blocks.iter().map(|blk| blk.header.clone()).collect(),
        }
    }

    pub fn key(&self) -> TipsetKey {
        TipsetKey(self.blocks.iter().map(|blk| blk.header.block_id()).collect())
    }

    pub fn epoch(&self) -> u64 {
        self.blocks[0].header.epoch
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
