//! PLY format support
//!
//! Reading covers the ASCII layout written by multi-view stereo tools: one
//! `element vertex N` section whose rows hold position, normal and 8-bit color
//! (9 fields). Writing goes through `ply-rs` and emits positions only.

use crate::{PointCloudReader, PointCloudWriter};
use log::debug;
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;
use voxcarve_core::{ColoredPoint3f, ColoredPointCloud3f, Error, Point3f, PointCloud, Result};

/// Last line of the PLY header
pub const END_HEADER: &str = "end_header";
/// x y z nx ny nz red green blue
pub const FIELDS_PER_ROW: usize = 9;
/// Upper bound on rows reserved up front from the header count
const MAX_RESERVED_ROWS: usize = 1 << 16;

pub struct PlyReader;
pub struct PlyWriter;

impl PointCloudReader for PlyReader {
    fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<ColoredPointCloud3f> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let cloud = parse_point_cloud(BufReader::new(file))?;
        debug!("read {} points from {}", cloud.len(), path.display());
        Ok(cloud)
    }
}

/// Parse an ASCII PLY point cloud from any buffered reader.
///
/// The bounding box is accumulated while rows are read. Fails with
/// [`Error::Format`] on a wrong magic line, a binary encoding, a missing
/// `end_header` or a short row, and with [`Error::BrokenFile`] when the input
/// ends before the declared vertex count.
pub fn parse_point_cloud<R: BufRead>(reader: R) -> Result<ColoredPointCloud3f> {
    let mut lines = reader.lines();

    // collect the header so rows can be reported by line number
    let mut header_text = String::new();
    let mut line_no = 0;
    let mut header_closed = false;
    for line in lines.by_ref() {
        let line = line?;
        line_no += 1;
        header_text.push_str(&line);
        header_text.push('\n');
        if line.trim() == END_HEADER {
            header_closed = true;
            break;
        }
    }

    let header = Parser::<DefaultElement>::new()
        .read_header(&mut header_text.as_bytes())
        .map_err(|e| Error::Format(format!("invalid ply header: {}", e)))?;
    if !header_closed {
        return Err(Error::Format(format!("missing '{}' line", END_HEADER)));
    }
    if header.encoding != Encoding::Ascii {
        return Err(Error::Format(format!(
            "unsupported ply encoding {:?}",
            header.encoding
        )));
    }
    let vertex_count = header.elements.get("vertex").map_or(0, |element| element.count);

    let mut cloud = PointCloud::with_capacity(vertex_count.min(MAX_RESERVED_ROWS));
    for row in 0..vertex_count {
        let line = match lines.next() {
            Some(line) => line?,
            None => {
                return Err(Error::BrokenFile {
                    expected: vertex_count,
                    found: row,
                })
            }
        };
        line_no += 1;

        let v = parse_row(&line).map_err(|message| Error::format_at(line_no, message))?;
        // normals (v[3..6]) are not used by the carving pipeline
        cloud.push(ColoredPoint3f::from_rgb8(
            Point3f::new(v[0], v[1], v[2]),
            [v[6], v[7], v[8]],
            row,
        ));
    }

    Ok(cloud)
}

fn parse_row(line: &str) -> std::result::Result<[f32; FIELDS_PER_ROW], String> {
    let mut values = [0.0f32; FIELDS_PER_ROW];
    let mut tokens = line.split_whitespace();
    for (i, slot) in values.iter_mut().enumerate() {
        let token = tokens
            .next()
            .ok_or_else(|| format!("expected {} fields, found {}", FIELDS_PER_ROW, i))?;
        *slot = token
            .parse()
            .map_err(|_| format!("invalid number '{}' in field {}", token, i + 1))?;
    }
    Ok(values)
}

impl PointCloudWriter for PlyWriter {
    fn write_point_cloud<P: AsRef<Path>>(cloud: &PointCloud<Point3f>, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        // Create PLY structure
        let mut ply = Ply::<DefaultElement>::new();

        // Define vertex element
        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = cloud.len();
        for axis in ["x", "y", "z"] {
            vertex_element.properties.add(PropertyDef::new(
                axis.to_string(),
                PropertyType::Scalar(ScalarType::Float),
            ));
        }
        ply.header.elements.add(vertex_element);

        // Add vertex data
        let mut vertices = Vec::with_capacity(cloud.len());
        for point in cloud {
            let mut vertex = DefaultElement::new();
            vertex.insert("x".to_string(), Property::Float(point.x));
            vertex.insert("y".to_string(), Property::Float(point.y));
            vertex.insert("z".to_string(), Property::Float(point.z));
            vertices.push(vertex);
        }
        ply.payload.insert("vertex".to_string(), vertices);

        let writer_instance = Writer::new();
        writer_instance.write_ply(&mut writer, &mut ply)?;

        Ok(())
    }
}
