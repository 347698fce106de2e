use std::io::{
    BufReader,
    Cursor,
};

use bevy::math::Mat4;

use bevy_splat_aggregate::{
    ATTRIBUTE_STRIDE,
    PackedSplat,
    SplatAggregator,
    SplatBuffer,
    io::{
        codec::SplatCodec,
        ply::parse_ply,
        splat::parse_splat,
    },
    random_splat_buffer,
    random_splats,
    splat::{
        harmonics::{
            pack_sh_textures,
            sh_texture_count,
            unpack_sh_texel,
        },
        packed::unpack_attributes,
    },
};


fn ply_fixture(rest: bool) -> String {
    let mut header = String::from("ply\nformat ascii 1.0\nelement vertex 2\n");
    let mut properties = vec![
        "x", "y", "z", "f_dc_0", "f_dc_1", "f_dc_2", "opacity",
        "scale_0", "scale_1", "scale_2", "rot_0", "rot_1", "rot_2", "rot_3",
    ]
    .into_iter()
    .map(String::from)
    .collect::<Vec<_>>();
    if rest {
        properties.extend((0..9).map(|i| format!("f_rest_{i}")));
    }
    for property in &properties {
        header.push_str(&format!("property float {property}\n"));
    }
    header.push_str("end_header\n");

    let rest_values = |offset: f32| {
        (0..9)
            .map(|i| format!("{}", offset + i as f32 * 0.125))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut first = String::from("1 2 3 0 0 0 0 0 0 0 1 0 0 0");
    let mut second = String::from("-1 0.5 0 1 1 1 10 -1 -1 -1 0 0 0 2");
    if rest {
        first = format!("{first} {}", rest_values(0.0));
        second = format!("{second} {}", rest_values(-1.0));
    }

    format!("{header}{first}\n{second}\n")
}


#[test]
fn test_codec() {
    let mut aggregator = SplatAggregator::default();
    aggregator.add_asset(random_splat_buffer(100, Some(1))).unwrap();
    let handle = aggregator.add_asset(random_splat_buffer(50, Some(1))).unwrap();
    aggregator
        .set_node_transform(handle, Mat4::from_translation(bevy::math::Vec3::Y))
        .unwrap();

    let buffer = aggregator.to_buffer();
    let encoded = buffer.encode().unwrap();
    let decoded = SplatBuffer::decode(encoded.as_slice()).unwrap();

    assert_eq!(buffer, decoded);
}

#[test]
fn test_decode_rejects_garbage() {
    assert!(SplatBuffer::decode(&[0xff, 0x01]).is_err());
}

#[test]
fn test_parse_splat() {
    let splats = random_splats(12);
    let bytes = bytemuck::cast_slice::<PackedSplat, u8>(&splats).to_vec();

    let buffer = parse_splat(bytes).unwrap();

    assert_eq!(buffer.splat_count, 12);
    assert!(buffer.sh_data.is_none());
    assert!(buffer.node_indices.is_none());
    assert_eq!(unpack_attributes(&buffer.attribute_data).unwrap(), splats);
}

#[test]
fn test_parse_splat_rejects_partial_record() {
    assert!(parse_splat(vec![0; ATTRIBUTE_STRIDE + 3]).is_err());
}

#[test]
fn test_parse_ply() {
    let mut reader = BufReader::new(Cursor::new(ply_fixture(false).into_bytes()));
    let buffer = parse_ply(&mut reader).unwrap();

    assert_eq!(buffer.splat_count, 2);
    assert!(buffer.sh_data.is_none());
    assert!(buffer.validate().is_ok());

    let first = buffer.splat(0).unwrap();
    assert_eq!(first.position, [1.0, 2.0, 3.0]);
    assert_eq!(first.scale, [1.0, 1.0, 1.0]);
    assert_eq!(first.color, [128, 128, 128, 128]);
    assert_eq!(first.rotation, [255, 128, 128, 128]);

    let second = buffer.splat(1).unwrap();
    assert_eq!(second.color[3], 255);
    assert!(second.color[0] > 128);
    // (rot_0, rot_1, rot_2, rot_3) = (0, 0, 0, 2) normalizes to a unit z rotation
    assert_eq!(second.rotation, [128, 128, 128, 255]);
}

#[test]
fn test_parse_ply_with_sh() {
    let mut reader = BufReader::new(Cursor::new(ply_fixture(true).into_bytes()));
    let buffer = parse_ply(&mut reader).unwrap();

    let textures = buffer.sh_data.as_ref().unwrap();
    assert_eq!(textures.len(), sh_texture_count(1));
    assert_eq!(buffer.sh_side(), Some(2));

    // file order is channel-major, textures are coefficient-major
    let coefficients = unpack_sh_texel(textures, 0, 1);
    let expected = [0.0, 0.375, 0.75, 0.125, 0.5, 0.875, 0.25, 0.625, 1.0];
    for (value, expected) in coefficients.iter().zip(expected) {
        assert!((value - expected).abs() < 1e-3, "{value} != {expected}");
    }
}

#[test]
fn test_parse_ply_missing_properties() {
    let ply = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nend_header\n0\n";
    let mut reader = BufReader::new(Cursor::new(ply.as_bytes().to_vec()));

    assert!(parse_ply(&mut reader).is_err());
}

#[test]
fn test_sh_texture_packing() {
    let degree = 3;
    let coefficients = (0..5 * 45)
        .map(|i| (i % 45) as f32 / 45.0 - 0.5)
        .collect::<Vec<f32>>();

    let textures = pack_sh_textures(&coefficients, degree, 5);
    assert_eq!(textures.len(), 6);
    assert!(textures.iter().all(|texture| texture.len() == 9 * 16));

    let unpacked = unpack_sh_texel(&textures, 4, degree);
    assert_eq!(unpacked.len(), 45);
    for (value, expected) in unpacked.iter().zip(&coefficients[4 * 45..]) {
        assert!((value - expected).abs() < 1e-3);
    }
}
