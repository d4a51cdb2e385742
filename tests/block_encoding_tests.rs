//! Serialization through the name-keyed encoding registry.


use std::sync::Arc;

use tessera_block::{
    deserialize_block, serialize_block, Block, BlockEncoding, BlockRef, DictionaryBlock,
    EncodingRegistry, FixedWidthBlock, SliceInput, SliceOutput, VariableWidthBlock,
};
use tessera_core::config::BlockConfig;
use tessera_core::error::{Error, Result};
use tessera_core::logical_type::LogicalType;
use tessera_core::session::Session;
use test_data_gen::{
    abc_dictionary, dictionary_block, generate_ids, id_block, string_dictionary, typed_blocks,
};

fn assert_same_values(expected: &dyn Block, actual: &dyn Block) {
    let session = Session::default();
    assert_eq!(expected.logical_type(), actual.logical_type());
    assert_eq!(expected.position_count(), actual.position_count());
    for position in 0..expected.position_count() {
        assert_eq!(
            expected.object_value(&session, position),
            actual.object_value(&session, position),
            "position {position}"
        );
        assert!(expected.equal_to(position, actual, position));
    }
}

fn encode_with(registry: &EncodingRegistry, block: &dyn Block) -> Vec<u8> {
    let mut out = SliceOutput::new();
    registry.write_block(&mut out, block).unwrap();
    out.into_inner()
}

fn decode_with(registry: &EncodingRegistry, bytes: &[u8]) -> Result<BlockRef> {
    registry.read_block(&mut SliceInput::new(bytes))
}

#[test]
fn test_fixed_width_round_trip_with_nulls() {
    let block = FixedWidthBlock::from_optional_longs(&[Some(7), None, Some(-9), None]);
    let bytes = serialize_block(&block).unwrap();
    let decoded = deserialize_block(&bytes).unwrap();
    assert_same_values(&block, decoded.as_ref());
    assert!(decoded.is_null(1));
    assert!(decoded.is_null(3));
}

#[test]
fn test_variable_width_round_trip() {
    let block = VariableWidthBlock::from_optional_strs(&[Some("tessera"), None, Some(""), Some("ok")]);
    let decoded = deserialize_block(&serialize_block(&block).unwrap()).unwrap();
    assert_same_values(&block, decoded.as_ref());
    assert_eq!(decoded.length(2), 0);
}

#[test]
fn test_dictionary_round_trip() {
    let block = dictionary_block(&abc_dictionary(), &[2, 0, 0, 1]);
    let bytes = serialize_block(&block).unwrap();

    // the stream leads with the outer encoding name
    let mut input = SliceInput::new(&bytes);
    assert_eq!(input.read_str().unwrap(), "DICTIONARY");

    let decoded = deserialize_block(&bytes).unwrap();
    assert_same_values(&block, decoded.as_ref());
    let decoded = decoded
        .as_any()
        .downcast_ref::<DictionaryBlock>()
        .expect("decoded as a dictionary block");
    assert_eq!(decoded.dictionary().position_count(), 3);
    assert_eq!(decoded.ids().logical_type(), LogicalType::BigInt);
}

#[test]
fn test_nested_dictionary_round_trip() {
    let inner: BlockRef = Arc::new(dictionary_block(&string_dictionary(5), &[4, 3, 2, 1, 0, 0]));
    let outer = DictionaryBlock::new(inner, id_block(&[5, 0, 2, 2])).unwrap();

    let decoded = deserialize_block(&serialize_block(&outer).unwrap()).unwrap();
    assert_same_values(&outer, decoded.as_ref());

    let decoded = decoded.as_any().downcast_ref::<DictionaryBlock>().unwrap();
    assert!(decoded
        .dictionary()
        .as_any()
        .downcast_ref::<DictionaryBlock>()
        .is_some());
}

#[test]
fn test_fixed_width_dictionary_round_trip() {
    let dictionary: BlockRef = Arc::new(FixedWidthBlock::from_doubles(&[1.5, f64::MAX, -0.0]));
    let block = dictionary_block(&dictionary, &[1, 2, 0, 1]);
    let decoded = deserialize_block(&serialize_block(&block).unwrap()).unwrap();
    assert_same_values(&block, decoded.as_ref());
}

#[test]
fn test_every_logical_type_round_trips() {
    for plain in typed_blocks() {
        let decoded = deserialize_block(&serialize_block(plain.as_ref()).unwrap()).unwrap();
        assert_same_values(plain.as_ref(), decoded.as_ref());
        assert!(decoded.is_null(1));

        let encoded = dictionary_block(&plain, &[0, 2, 1, 0]);
        let decoded = deserialize_block(&serialize_block(&encoded).unwrap()).unwrap();
        assert_same_values(&encoded, decoded.as_ref());
        assert!(decoded.is_null(2));
    }
}

#[test]
fn test_region_round_trip() {
    let dictionary = string_dictionary(32);
    let block = dictionary_block(&dictionary, &generate_ids(200, 32, 3));
    let region = block.get_region(50, 25).unwrap();
    let decoded = deserialize_block(&serialize_block(region.as_ref()).unwrap()).unwrap();
    assert_same_values(region.as_ref(), decoded.as_ref());

    let plain = VariableWidthBlock::from_strs(&["w", "x", "y", "z"]);
    let region = plain.get_region(1, 2).unwrap();
    let decoded = deserialize_block(&serialize_block(region.as_ref()).unwrap()).unwrap();
    assert_same_values(region.as_ref(), decoded.as_ref());
}

#[test]
fn test_unknown_encoding_name_fails() {
    let mut out = SliceOutput::new();
    out.write_str("RUN_LENGTH").unwrap();
    out.write_u32(4);
    let err = deserialize_block(out.as_slice()).unwrap_err();
    assert!(matches!(err, Error::UnknownEncoding(ref name) if name == "RUN_LENGTH"));
}

#[test]
fn test_unknown_nested_encoding_fails() {
    // a dictionary whose id block names an encoding nobody registered
    let mut out = SliceOutput::new();
    out.write_str("DICTIONARY").unwrap();
    let dictionary = abc_dictionary();
    let registry = EncodingRegistry::default();
    registry.write_block(&mut out, dictionary.as_ref()).unwrap();
    out.write_str("BIT_PACKED").unwrap();

    let err = decode_with(&registry, out.as_slice()).unwrap_err();
    assert!(matches!(err, Error::UnknownEncoding(ref name) if name == "BIT_PACKED"));
}

#[test]
fn test_deeply_nested_stream_fails_cleanly() {
    let mut out = SliceOutput::new();
    for _ in 0..200_000 {
        out.write_str("DICTIONARY").unwrap();
    }
    let err = deserialize_block(out.as_slice()).unwrap_err();
    assert!(matches!(err, Error::Corrupt(ref msg) if msg.contains("nested deeper")));
}

#[test]
fn test_nesting_limit_is_configurable() {
    let inner: BlockRef = Arc::new(dictionary_block(&abc_dictionary(), &[2, 1, 0]));
    let outer = DictionaryBlock::new(inner, id_block(&[0, 2])).unwrap();

    // outer dictionary, inner dictionary, then the plain values: three levels
    let shallow = EncodingRegistry::new(BlockConfig {
        max_nesting_depth: 2,
        ..BlockConfig::default()
    })
    .unwrap();
    let bytes = encode_with(&shallow, &outer);
    assert!(matches!(decode_with(&shallow, &bytes), Err(Error::Corrupt(_))));

    let deep = EncodingRegistry::new(BlockConfig {
        max_nesting_depth: 3,
        ..BlockConfig::default()
    })
    .unwrap();
    let decoded = decode_with(&deep, &bytes).unwrap();
    assert_same_values(&outer, decoded.as_ref());

    // the depth counter unwinds, so sibling blocks in one stream decode too
    let mut out = SliceOutput::new();
    deep.write_block(&mut out, &outer).unwrap();
    deep.write_block(&mut out, &outer).unwrap();
    let mut input = SliceInput::new(out.as_slice());
    deep.read_block(&mut input).unwrap();
    deep.read_block(&mut input).unwrap();
    assert_eq!(input.remaining(), 0);
    assert_eq!(input.nesting_depth(), 0);
}

#[test]
fn test_truncated_stream_is_corrupt() {
    let block = dictionary_block(&abc_dictionary(), &[0, 1, 2]);
    let bytes = serialize_block(&block).unwrap();
    for cut in [1, 8, bytes.len() / 2, bytes.len() - 1] {
        let err = deserialize_block(&bytes[..cut]).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)), "cut at {cut}: {err}");
    }
}

#[test]
fn test_out_of_range_ids_rejected_when_validating() {
    let block = dictionary_block(&abc_dictionary(), &[0, 3]);
    let registry = EncodingRegistry::new(BlockConfig::default()).unwrap();
    let bytes = encode_with(&registry, &block);

    let err = decode_with(&registry, &bytes).unwrap_err();
    assert!(matches!(err, Error::Corrupt(_)));
}

#[test]
fn test_out_of_range_ids_accepted_without_validation() {
    let block = dictionary_block(&abc_dictionary(), &[0, 3]);
    let config = BlockConfig {
        validate_decoded_ids: false,
        ..BlockConfig::default()
    };
    let registry = EncodingRegistry::new(config).unwrap();
    let bytes = encode_with(&registry, &block);

    let decoded = decode_with(&registry, &bytes).unwrap();
    assert_eq!(decoded.position_count(), 2);
    assert_eq!(decoded.get_slice_value(0), b"a");
}

#[test]
fn test_decode_limits_apply() {
    let config = BlockConfig {
        max_dictionary_positions: 2,
        ..BlockConfig::default()
    };
    let registry = EncodingRegistry::new(config).unwrap();
    let bytes = encode_with(&registry, &dictionary_block(&abc_dictionary(), &[0]));
    assert!(matches!(decode_with(&registry, &bytes), Err(Error::Corrupt(_))));

    let config = BlockConfig {
        max_decoded_block_bytes: 4,
        ..BlockConfig::default()
    };
    let registry = EncodingRegistry::new(config).unwrap();
    let block = VariableWidthBlock::from_strs(&["longer than four bytes"]);
    let bytes = encode_with(&registry, &block);
    assert!(matches!(decode_with(&registry, &bytes), Err(Error::Corrupt(_))));
}

#[test]
fn test_invalid_registry_config_rejected() {
    let config = BlockConfig {
        max_decoded_block_bytes: 0,
        ..BlockConfig::default()
    };
    assert!(matches!(EncodingRegistry::new(config), Err(Error::Config(_))));
}

fn decode_constant(_registry: &EncodingRegistry, input: &mut SliceInput<'_>) -> Result<BlockRef> {
    let count = input.read_len()?;
    Ok(Arc::new(FixedWidthBlock::from_longs(&vec![42; count])))
}

#[test]
fn test_custom_encoding_registration() {
    let mut registry = EncodingRegistry::default();
    assert!(!registry.contains("CONSTANT"));
    registry.register("CONSTANT", decode_constant).unwrap();
    assert!(registry.contains("CONSTANT"));
    assert!(registry.register("CONSTANT", decode_constant).is_err());

    let mut out = SliceOutput::new();
    out.write_str("CONSTANT").unwrap();
    out.write_len(3).unwrap();
    let block = decode_with(&registry, out.as_slice()).unwrap();
    assert_eq!(block.position_count(), 3);
    assert_eq!(block.get_long_value(2), 42);

    // the built-in registry still does not know it
    assert!(matches!(
        deserialize_block(out.as_slice()),
        Err(Error::UnknownEncoding(_))
    ));
}

#[test]
fn test_encoding_descriptor_names() {
    let plain = FixedWidthBlock::from_longs(&[1]);
    assert_eq!(plain.encoding().name(), "FIXED_WIDTH");
    let strings = VariableWidthBlock::from_strs(&["x"]);
    assert_eq!(strings.encoding().name(), "VARIABLE_WIDTH");
    let dictionary = dictionary_block(&abc_dictionary(), &[0]);
    assert_eq!(dictionary.encoding().name(), "DICTIONARY");
}
