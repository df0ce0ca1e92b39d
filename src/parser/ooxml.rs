//! Office Open XML package access.
//!
//! A `.docx`, `.xlsx`, or `.pptx` file is a ZIP archive of XML parts linked
//! by relationship files (`_rels/*.rels`). [`Package`] reads parts and
//! resolves relationship targets to absolute part names.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::Event;
use zip::result::ZipError;
use zip::ZipArchive;

use super::xml;
use crate::detect::{detect_container, extension_of, Container};
use crate::error::{Error, Result};
use crate::model::DocumentBuilder;

/// Extensions of the legacy binary formats that share the compound file container.
const LEGACY_EXTENSIONS: &[&str] = &["doc", "xls", "ppt"];

/// An opened OOXML package.
pub(crate) struct Package<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Package<'a> {
    /// Open a ZIP package.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::CorruptFile(format!("cannot open package: {}", e)))?;
        Ok(Self { archive })
    }

    /// Open the package of an Office file, classifying non-ZIP content.
    ///
    /// A compound file under a legacy extension is an old binary document,
    /// which has no backend. Under an OOXML extension it is an encrypted package.
    pub fn open_office(filename: &str, data: &'a [u8]) -> Result<Self> {
        match detect_container(data) {
            Container::Zip => Self::open(data),
            Container::Cfb => {
                let ext = extension_of(filename).unwrap_or_default();
                if LEGACY_EXTENSIONS.contains(&ext.as_str()) {
                    Err(Error::DependencyFailure(format!(
                        "legacy binary .{} files are not supported; save as .{}x",
                        ext, ext
                    )))
                } else {
                    Err(Error::PasswordProtected)
                }
            }
            _ => Err(Error::CorruptFile(
                "not an Office Open XML package".to_string(),
            )),
        }
    }

    /// Check whether a part exists.
    pub fn has_part(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Names of all parts in archive order.
    pub fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Read a part as raw bytes.
    pub fn read_bytes(&mut self, name: &str) -> Result<Vec<u8>> {
        self.read_optional_bytes(name)?
            .ok_or_else(|| Error::CorruptFile(format!("missing part {}", name)))
    }

    /// Read a part as raw bytes, or `None` if the part does not exist.
    pub fn read_optional_bytes(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(Error::DependencyFailure(format!(
                    "cannot read {}: {}",
                    name, e
                )))
            }
        };
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)
            .map_err(|e| Error::DependencyFailure(format!("cannot read {}: {}", name, e)))?;
        Ok(Some(buf))
    }

    /// Read a required XML part as text.
    pub fn read_string(&mut self, name: &str) -> Result<String> {
        let bytes = self.read_bytes(name)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read an optional XML part as text.
    pub fn read_optional_string(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self
            .read_optional_bytes(name)?
            .map(|b| String::from_utf8_lossy(&b).into_owned()))
    }

    /// Relationships of a part. Missing relationship files yield an empty set.
    pub fn relationships(&mut self, part: &str) -> Result<Relationships> {
        let rels_name = rels_path(part);
        match self.read_optional_string(&rels_name)? {
            Some(xml) => Relationships::parse(part, &rels_name, &xml),
            None => Ok(Relationships::default()),
        }
    }

    /// Copy the package's core properties (`docProps/core.xml`) into the document.
    pub fn core_properties(&mut self, doc: &mut DocumentBuilder) -> Result<()> {
        const PART: &str = "docProps/core.xml";
        let Some(xml) = self.read_optional_string(PART)? else {
            return Ok(());
        };

        let mut reader = xml::reader(&xml);
        let mut current: Option<&'static str> = None;
        let mut value = String::new();

        loop {
            match reader.read_event().map_err(|e| xml::xml_error(PART, e))? {
                Event::Start(e) => {
                    current = core_property_key(xml::local(&e));
                    value.clear();
                }
                Event::Text(e) if current.is_some() => value.push_str(&xml::text(&e)),
                Event::GeneralRef(e) if current.is_some() => value.push_str(&xml::entity(&e)),
                Event::End(_) => {
                    if let Some(key) = current.take() {
                        doc.set_metadata(key, value.as_str());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(())
    }
}

/// Metadata key for a core property element.
fn core_property_key(local: &[u8]) -> Option<&'static str> {
    let key = match local {
        b"title" => "title",
        b"subject" => "subject",
        b"creator" => "author",
        b"keywords" => "keywords",
        b"description" => "description",
        b"lastModifiedBy" => "last_modified_by",
        b"revision" => "revision",
        b"created" => "created",
        b"modified" => "modified",
        b"category" => "category",
        b"contentStatus" => "content_status",
        b"language" => "language",
        _ => return None,
    };
    Some(key)
}

/// A relationship from one part to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    /// Relationship type URI
    pub rel_type: String,
    /// Absolute part name (or the raw URI for external targets)
    pub target: String,
    /// Whether the target lives outside the package
    pub external: bool,
}

/// Relationships of one part, keyed by id.
#[derive(Debug, Clone, Default)]
pub(crate) struct Relationships {
    by_id: HashMap<String, Relationship>,
}

impl Relationships {
    fn parse(part: &str, rels_name: &str, xml: &str) -> Result<Self> {
        let mut by_id = HashMap::new();
        let mut reader = xml::reader(xml);

        loop {
            match reader
                .read_event()
                .map_err(|e| xml::xml_error(rels_name, e))?
            {
                Event::Start(e) | Event::Empty(e) if xml::local(&e) == b"Relationship" => {
                    let (Some(id), Some(target)) = (xml::attr(&e, b"Id"), xml::attr(&e, b"Target"))
                    else {
                        continue;
                    };
                    let external = xml::attr(&e, b"TargetMode").as_deref() == Some("External");
                    let target = if external {
                        target
                    } else {
                        resolve_target(part, &target)
                    };
                    by_id.insert(
                        id,
                        Relationship {
                            rel_type: xml::attr(&e, b"Type").unwrap_or_default(),
                            target,
                            external,
                        },
                    );
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { by_id })
    }

    /// Look up a relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Absolute part name of an internal relationship target.
    pub fn target(&self, id: &str) -> Option<&str> {
        self.get(id)
            .filter(|r| !r.external)
            .map(|r| r.target.as_str())
    }
}

/// Relationship file for a part: `word/document.xml` -> `word/_rels/document.xml.rels`.
fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub(crate) fn resolve_target(part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute.split('/').collect());
    }
    let mut segments: Vec<&str> = part
        .rsplit_once('/')
        .map(|(dir, _)| dir.split('/').collect())
        .unwrap_or_default();
    segments.extend(target.split('/'));
    normalize(segments)
}

fn normalize(segments: Vec<&str>) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(segments.len());
    for seg in segments {
        match seg {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}
