use std::fs;
use std::path::Path;

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::{tags, uids};
use dicom_pcv::{
    config::PcvConfig,
    enums::Component,
    pipeline::{PcvPipeline, PipelineError},
    volume_loader::VolumeLoaderError,
};

const SLOPE: f64 = 0.5;
const INTERCEPT: f64 = -100.0;

/// Stored value whose rescaled value is `value`.
fn raw(value: f64) -> u16 {
    ((value - INTERCEPT) / SLOPE) as u16
}

fn strs(values: &[String]) -> PrimitiveValue {
    PrimitiveValue::Strs(values.iter().cloned().collect())
}

/// Writes a single-frame MR slice of 1 row, 2 columns at height `z`.
fn write_slice(path: &Path, uid: &str, z: f64, values: [f64; 2]) {
    let mut obj = InMemDicomObject::new_empty();
    obj.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(uids::MR_IMAGE_STORAGE),
    ));
    obj.put(DataElement::new(tags::SOP_INSTANCE_UID, VR::UI, PrimitiveValue::from(uid)));
    obj.put(DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)));
    obj.put(DataElement::new(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    ));
    obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(1_u16)));
    obj.put(DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(2_u16)));
    obj.put(DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)));
    obj.put(DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)));
    obj.put(DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)));
    obj.put(DataElement::new(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16)));
    obj.put(DataElement::new(
        tags::PIXEL_SPACING,
        VR::DS,
        strs(&["2".to_string(), "3".to_string()]),
    ));
    obj.put(DataElement::new(
        tags::IMAGE_POSITION_PATIENT,
        VR::DS,
        strs(&["10".to_string(), "20".to_string(), z.to_string()]),
    ));
    obj.put(DataElement::new(tags::RESCALE_SLOPE, VR::DS, PrimitiveValue::from(SLOPE.to_string())));
    obj.put(DataElement::new(
        tags::RESCALE_INTERCEPT,
        VR::DS,
        PrimitiveValue::from(INTERCEPT.to_string()),
    ));
    obj.put(DataElement::new(
        tags::PIXEL_DATA,
        VR::OW,
        PrimitiveValue::U16(values.iter().map(|v| raw(*v)).collect()),
    ));

    let file_obj = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .media_storage_sop_class_uid(uids::MR_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(uid)
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN),
        )
        .unwrap();
    file_obj.write_to_file(path).unwrap();
}

/// Two timesteps, two slices per stack. Velocities are
/// `100 * timestep + 10 * component + slice`.
fn write_export(root: &Path) {
    let reference = root.join("reference");
    fs::create_dir_all(&reference).unwrap();
    // Written out of position order; the loader sorts by z.
    write_slice(&reference.join("ref_a.dcm"), "2.25.1", 5.0, [-10.0, 150.0]);
    write_slice(&reference.join("ref_b.dcm"), "2.25.2", 0.0, [-100.0, 100.0]);

    let (timesteps, slices) = (2, 2);
    for component in Component::ALL {
        for timestep in 1..=timesteps {
            let dir = root.join(timestep.to_string()).join(component.name());
            fs::create_dir_all(&dir).unwrap();
            let first = 1 + component.index() * timesteps * slices + (timestep - 1) * slices;
            for slice in 0..slices {
                let number = first + slice;
                let value = (100 * timestep + 10 * component.index() + slice) as f64;
                write_slice(
                    &dir.join(format!("image{number:05}.dcm")),
                    &format!("2.25.1{number}"),
                    5.0 * slice as f64,
                    [value, value],
                );
            }
        }
    }
}

fn config(root: &Path) -> PcvConfig {
    PcvConfig {
        input_directory: root.to_path_buf(),
        reference_directory: root.join("reference"),
        output_file_name: root.join("out").join("flow").to_string_lossy().into_owned(),
        number_of_timesteps: 2,
        slices_per_stack: 2,
        ..Default::default()
    }
}

#[test]
fn extracts_masked_velocities_from_dicom_export() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());

    let summary = PcvPipeline::from_config(&config(dir.path()))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.number_data_points, 2);
    assert_eq!(summary.timestep_files.len(), 2);

    let geom = fs::read_to_string(dir.path().join("out").join("flow.geom")).unwrap();
    assert_eq!(
        geom,
        "2\n10.000000 20.000000 0.000000\n10.000000 20.000000 5.000000\n"
    );

    let first = fs::read_to_string(dir.path().join("out").join("flow1.pcv")).unwrap();
    assert_eq!(
        first,
        "2\n100.000000 110.000000 120.000000\n101.000000 111.000000 121.000000\n"
    );
    let second = fs::read_to_string(dir.path().join("out").join("flow2.pcv")).unwrap();
    assert_eq!(
        second,
        "2\n200.000000 210.000000 220.000000\n201.000000 211.000000 221.000000\n"
    );
}

#[test]
fn geometry_and_timestep_files_have_matching_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());

    let summary = PcvPipeline::from_config(&config(dir.path()))
        .unwrap()
        .run()
        .unwrap();

    let geom_lines = fs::read_to_string(&summary.geometry_file).unwrap().lines().count();
    for file in &summary.timestep_files {
        let contents = fs::read_to_string(file).unwrap();
        assert_eq!(contents.lines().count(), geom_lines);
        assert_eq!(contents.lines().next(), Some("2"));
    }
}

#[test]
fn missing_stack_names_the_archetype() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());
    fs::remove_file(dir.path().join("2").join("w").join("image00011.dcm")).unwrap();

    let result = PcvPipeline::from_config(&config(dir.path())).unwrap().run();

    match result {
        Err(PipelineError::Component {
            timestep: 2,
            component: Component::W,
            source: VolumeLoaderError::MissingArchetype(path),
        }) => assert!(path.ends_with("2/w/image00011.dcm")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn keep_going_zeroes_a_stack_with_missing_slices() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());
    // The archetype image00005.dcm stays, so the stack loads one slice short.
    fs::remove_file(dir.path().join("1").join("v").join("image00006.dcm")).unwrap();

    let settings = PcvConfig {
        keep_going: true,
        ..config(dir.path())
    };
    let summary = PcvPipeline::from_config(&settings).unwrap().run().unwrap();

    assert_eq!(
        fs::read_to_string(&summary.timestep_files[0]).unwrap(),
        "2\n100.000000 0.000000 120.000000\n101.000000 0.000000 121.000000\n"
    );
    assert_eq!(
        fs::read_to_string(&summary.timestep_files[1]).unwrap(),
        "2\n200.000000 210.000000 220.000000\n201.000000 211.000000 221.000000\n"
    );
}

#[test]
fn stack_with_missing_slices_aborts_by_default() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());
    fs::remove_file(dir.path().join("1").join("v").join("image00006.dcm")).unwrap();

    let result = PcvPipeline::from_config(&config(dir.path())).unwrap().run();

    assert!(matches!(result, Err(PipelineError::Volume(_))));
}
