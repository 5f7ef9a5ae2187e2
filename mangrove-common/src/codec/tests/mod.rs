use std::io::Cursor;

use rand::{thread_rng, Rng};

use super::*;

#[test]
fn codec_for_bool() {
    let t = true;
    let f = false;
    assert_eq!(&t.serialize_to_vec(), &vec![1u8]);
    assert_eq!(&f.serialize_to_vec(), &vec![0u8]);
    assert_eq!(
        bool::wire_deserialize(&mut Cursor::new(&t.serialize_to_vec())).unwrap(),
        t
    );
    assert_eq!(
        bool::wire_deserialize(&mut Cursor::new(&f.serialize_to_vec())).unwrap(),
        f
    );
    assert!(bool::wire_deserialize(&mut Cursor::new(&vec![2u8])).is_err());
}

#[test]
fn codec_for_ints() {
    let n: u64 = 0x1234567890abcdef;
    assert_eq!(
        &n.serialize_to_vec(),
        &vec![0x12, 0x34, 0x56, 0x78, 0x90, 0xab, 0xcd, 0xef]
    );
    assert_eq!(
        u64::wire_deserialize(&mut Cursor::new(&n.serialize_to_vec())).unwrap(),
        n
    );

    let m: u32 = 0xdeadbeef;
    assert_eq!(&m.serialize_to_vec(), &vec![0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(
        u32::wire_deserialize(&mut Cursor::new(&m.serialize_to_vec())).unwrap(),
        m
    );

    // not enough bytes
    assert!(u64::wire_deserialize(&mut Cursor::new(&vec![0x12, 0x34])).is_err());

    let mut rng = thread_rng();
    for _ in 0..32 {
        let n: u64 = rng.gen();
        assert_eq!(
            u64::wire_deserialize(&mut Cursor::new(&n.serialize_to_vec())).unwrap(),
            n
        );
    }
}

#[test]
fn codec_for_option() {
    let s = Some(0x01020304u32);
    let n: Option<u32> = None;
    assert_eq!(&s.serialize_to_vec(), &vec![1u8, 0x01, 0x02, 0x03, 0x04]);
    assert_eq!(&n.serialize_to_vec(), &vec![0u8]);
    assert_eq!(
        Option::<u32>::wire_deserialize(&mut Cursor::new(&s.serialize_to_vec())).unwrap(),
        s
    );
    assert_eq!(
        Option::<u32>::wire_deserialize(&mut Cursor::new(&n.serialize_to_vec())).unwrap(),
        n
    );

    // only 0x00 and 0x01 are valid tags
    assert!(Option::<u32>::wire_deserialize(&mut Cursor::new(&vec![2u8, 0, 0, 0, 0])).is_err());
}

#[test]
fn codec_for_vec() {
    let v: Vec<u16> = vec![0x0102, 0x0304];
    assert_eq!(
        &v.serialize_to_vec(),
        &vec![0x00, 0x00, 0x00, 0x02, 0x01, 0x02, 0x03, 0x04]
    );
    assert_eq!(
        Vec::<u16>::wire_deserialize(&mut Cursor::new(&v.serialize_to_vec())).unwrap(),
        v
    );

    let empty: Vec<u16> = vec![];
    assert_eq!(&empty.serialize_to_vec(), &vec![0x00, 0x00, 0x00, 0x00]);
}

#[test]
fn codec_vec_bounds() {
    let v: Vec<u8> = vec![1, 2, 3, 4];
    let bytes = v.serialize_to_vec();

    // at most
    assert_eq!(
        read_next_at_most::<_, u8>(&mut Cursor::new(&bytes), 4).unwrap(),
        v
    );
    assert!(read_next_at_most::<_, u8>(&mut Cursor::new(&bytes), 3).is_err());

    // exact
    assert_eq!(
        read_next_exact::<_, u8>(&mut Cursor::new(&bytes), 4).unwrap(),
        v
    );
    assert!(read_next_exact::<_, u8>(&mut Cursor::new(&bytes), 5).is_err());

    // length prefix promises more items than the stream has
    let mut truncated = bytes.clone();
    truncated.truncate(6);
    assert!(Vec::<u8>::wire_deserialize(&mut Cursor::new(&truncated)).is_err());
}

#[test]
fn codec_for_string() {
    let s = "hello peer".to_string();
    let bytes = s.serialize_to_vec();
    assert_eq!(
        String::wire_deserialize(&mut Cursor::new(&bytes)).unwrap(),
        s
    );

    // not valid UTF-8
    let bad: Vec<u8> = vec![0x00, 0x00, 0x00, 0x02, 0xff, 0xfe];
    assert!(String::wire_deserialize(&mut Cursor::new(&bad)).is_err());

    // capped read
    assert!(read_next_string(&mut Cursor::new(&bytes), 4).is_err());
    assert_eq!(
        read_next_string(&mut Cursor::new(&bytes), 64).unwrap(),
        "hello peer"
    );
}
