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

use mangrove_common::codec::{
    read_next, read_next_at_most, read_next_string, write_next, Error as codec_error, WireCodec,
};
use mangrove_common::types::BlockId;

use crate::chain::{BlockHeader, MAX_TIPSET_BLOCKS};
use crate::net::{
    ChainData, CompactedMessages, GetChainData, TipsetBundle, MAX_ERROR_MESSAGE_LEN,
    MAX_POOL_MESSAGES, MAX_REQUEST_LENGTH,
};

impl WireCodec for GetChainData {
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.head)?;
        write_next(fd, &self.length)?;
        write_next(fd, &self.options)?;
        Ok(())
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<GetChainData, codec_error> {
        let head: Vec<BlockId> = read_next_at_most(fd, MAX_TIPSET_BLOCKS)?;
        let length: u64 = read_next(fd)?;
        let options: u64 = read_next(fd)?;
        Ok(GetChainData {
            head,
            length,
            options,
        })
    }
}

impl WireCodec for ChainData {
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.status)?;
        write_next(fd, &self.error_message)?;
        write_next(fd, &self.chain)?;
        Ok(())
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<ChainData, codec_error> {
        let status: u64 = read_next(fd)?;
        let error_message = read_next_string(fd, MAX_ERROR_MESSAGE_LEN)?;
        let chain: Vec<TipsetBundle> = read_next_at_most(fd, MAX_REQUEST_LENGTH as u32)?;
        Ok(ChainData {
            status,
            error_message,
            chain,
        })
    }
}

impl WireCodec for TipsetBundle {
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.headers)?;
        write_next(fd, &self.messages)?;
        Ok(())
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<TipsetBundle, codec_error> {
        let headers: Vec<BlockHeader> = read_next_at_most(fd, MAX_TIPSET_BLOCKS)?;
        let messages: Option<CompactedMessages> = read_next(fd)?;
        Ok(TipsetBundle { headers, messages })
    }
}

/// Read the per-block include lists: one list of pool indices per block.
fn read_next_includes<R: Read>(fd: &mut R) -> Result<Vec<Vec<u64>>, codec_error> {
    let num_blocks: u32 = read_next(fd)?;
    if num_blocks > MAX_TIPSET_BLOCKS {
        return Err(codec_error::DeserializeError(format!(
            "Include lists cover too many blocks ({} > {})",
            num_blocks, MAX_TIPSET_BLOCKS
        )));
    }
    let mut ret = Vec::with_capacity(num_blocks as usize);
    for _i in 0..num_blocks {
        ret.push(read_next_at_most::<_, u64>(fd, MAX_POOL_MESSAGES)?);
    }
    Ok(ret)
}

impl WireCodec for CompactedMessages {
    fn wire_serialize<W: Write>(&self, fd: &mut W) -> Result<(), codec_error> {
        write_next(fd, &self.bls_msgs)?;
        write_next(fd, &self.bls_includes)?;
        write_next(fd, &self.secp_msgs)?;
        write_next(fd, &self.secp_includes)?;
        Ok(())
    }

    fn wire_deserialize<R: Read>(fd: &mut R) -> Result<CompactedMessages, codec_error> {
        let bls_msgs = read_next_at_most(fd, MAX_POOL_MESSAGES)?;
        let bls_includes = read_next_includes(fd)?;
        let secp_msgs = read_next_at_most(fd, MAX_POOL_MESSAGES)?;
        let secp_includes = read_next_includes(fd)?;
        Ok(CompactedMessages {
            bls_msgs,
            bls_includes,
            secp_msgs,
            secp_includes,
        })
    }
}

#[cfg(test)]
mod test {
    use mangrove_common::types::{AccountId, BlsSignatureBuffer, MessageSignature};
    use mangrove_common::util::hash::Sha256Sum;

    use super::*;
    use crate::chain::{SignedMessage, TipsetKey, UnsignedMessage};
    use crate::net::{ExchangeStatus, GetChainDataFlags, STATUS_OK};

    fn fake_header(epoch: u64, seed: u8) -> BlockHeader {
        BlockHeader {
            parents: TipsetKey::new(vec![BlockId([seed.wrapping_add(1); 32])]),
            epoch,
            weight: epoch * 100,
            miner: AccountId([seed; 20]),
            state_root: Sha256Sum([seed; 32]),
            messages_root: Sha256Sum([seed ^ 0xff; 32]),
            timestamp: 1700000000 + epoch * 30,
            bls_aggregate: BlsSignatureBuffer::empty(),
        }
    }

    fn fake_unsigned(nonce: u64) -> UnsignedMessage {
        UnsignedMessage {
            from: AccountId([0x0a; 20]),
            to: AccountId([0x0b; 20]),
            nonce,
            amount: 1000 + nonce,
            payload: vec![0xde, 0xad, 0xbe, 0xef],
        }
    }

    fn fake_signed(nonce: u64) -> SignedMessage {
        SignedMessage {
            message: fake_unsigned(nonce),
            signature: MessageSignature([nonce as u8; 65]),
        }
    }

    fn fake_compacted() -> CompactedMessages {
        CompactedMessages {
            bls_msgs: vec![fake_unsigned(1), fake_unsigned(2)],
            bls_includes: vec![vec![0, 1], vec![1]],
            secp_msgs: vec![fake_signed(3)],
            secp_includes: vec![vec![0], vec![0]],
        }
    }

    #[test]
    fn get_chain_data_round_trip() {
        let req = GetChainData::new(
            vec![BlockId([0x11; 32]), BlockId([0x22; 32])],
            10,
            GetChainDataFlags::new(true, true),
        );
        let bytes = req.serialize_to_vec();
        let parsed = GetChainData::wire_deserialize(&mut &bytes[..]).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn get_chain_data_wire_layout_is_stable() {
        // head list, then length, then options; all big-endian
        let req = GetChainData::new(
            vec![BlockId([0x11; 32])],
            3,
            GetChainDataFlags::new(true, true),
        );
        let mut expected: Vec<u8> = vec![0x00, 0x00, 0x00, 0x01];
        expected.extend_from_slice(&[0x11; 32]);
        expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03]);
        expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03]);
        assert_eq!(req.serialize_to_vec(), expected);
    }

    #[test]
    fn get_chain_data_rejects_oversized_head() {
        // count prefix far beyond the block cap
        let mut bytes: Vec<u8> = vec![0x00, 0x01, 0x00, 0x00];
        bytes.extend_from_slice(&[0x11; 32]);
        assert!(GetChainData::wire_deserialize(&mut &bytes[..]).is_err());
    }

    #[test]
    fn chain_data_round_trip() {
        let res = ChainData {
            status: STATUS_OK,
            error_message: String::new(),
            chain: vec![
                TipsetBundle {
                    headers: vec![fake_header(10, 0x01), fake_header(10, 0x02)],
                    messages: Some(fake_compacted()),
                },
                TipsetBundle {
                    headers: vec![fake_header(9, 0x03)],
                    messages: None,
                },
            ],
        };
        let bytes = res.serialize_to_vec();
        let parsed = ChainData::wire_deserialize(&mut &bytes[..]).unwrap();
        assert_eq!(parsed, res);
    }

    #[test]
    fn chain_data_error_round_trip() {
        let res = ChainData::error(ExchangeStatus::NotFound, "no such tipset");
        let bytes = res.serialize_to_vec();
        let parsed = ChainData::wire_deserialize(&mut &bytes[..]).unwrap();
        assert_eq!(parsed.status(), ExchangeStatus::NotFound);
        assert_eq!(parsed.error_message, "no such tipset");
        assert!(parsed.chain.is_empty());
    }

    #[test]
    fn chain_data_rejects_oversized_error_message() {
        let res = ChainData::error(
            ExchangeStatus::InternalError,
            &"x".repeat((MAX_ERROR_MESSAGE_LEN + 1) as usize),
        );
        let bytes = res.serialize_to_vec();
        assert!(ChainData::wire_deserialize(&mut &bytes[..]).is_err());
    }

    #[test]
    fn tipset_bundle_rejects_bad_option_tag() {
        let bundle = TipsetBundle {
            headers: vec![fake_header(5, 0x01)],
            messages: None,
        };
        let mut bytes = bundle.serialize_to_vec();
        // flip the Option tag at the tail to something undefined
        let last = bytes.len() - 1;
        bytes[last] = 0x02;
        assert!(TipsetBundle::wire_deserialize(&mut &bytes[..]).is_err());
    }

    #[test]
    fn compacted_messages_round_trip() {
        let msgs = fake_compacted();
        let bytes = msgs.serialize_to_vec();
        let parsed = CompactedMessages::wire_deserialize(&mut &bytes[..]).unwrap();
        assert_eq!(parsed, msgs);
    }

    #[test]
    fn compacted_messages_rejects_truncation() {
        let msgs = fake_compacted();
        let bytes = msgs.serialize_to_vec();
        for cut in [1, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                CompactedMessages::wire_deserialize(&mut &bytes[..cut]).is_err(),
                "truncation at {cut} must not decode"
            );
        }
    }

    #[test]
    fn includes_reject_too_many_blocks() {
        let mut bytes: Vec<u8> = vec![];
        // empty bls pool
        write_next(&mut bytes, &Vec::<UnsignedMessage>::new()).unwrap();
        // include lists claiming more blocks than a tipset can hold
        write_next(&mut bytes, &(MAX_TIPSET_BLOCKS + 1)).unwrap();
        assert!(CompactedMessages::wire_deserialize(&mut &bytes[..]).is_err());
    }
}
