use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::app::RenderableKind;
use crate::AppPaths;

use super::database::{DefDatabase, EntityArchetype, EntityDefId};
use super::discovery::{discover_content_sources, DiscoveryError};

const MODEL_PREFIX: &str = "Model:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    Discovery,
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateDefInMod,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub mod_id: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (mod={}, file={}, line={}, column={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (mod={}, file={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

#[derive(Debug, Clone)]
struct PendingEntityDef {
    def_name: String,
    label: String,
    renderable: RenderableKind,
    hit_radius: Option<f32>,
    tags: Vec<String>,
}

/// Compiles every `*.xml` under base content and the enabled mods into one database.
///
/// Files are read in sorted relative-path order. A def name may appear once per source;
/// a later source replaces an earlier definition wholesale.
pub fn compile_def_database(
    app_paths: &AppPaths,
    enabled_mods: &[String],
) -> Result<DefDatabase, ContentCompileError> {
    let sources = discover_content_sources(app_paths, enabled_mods)
        .map_err(|error| map_discovery_error(error, &app_paths.root))?;

    let mut merged = BTreeMap::<String, PendingEntityDef>::new();

    for source in sources {
        let xml_files = collect_xml_files_sorted(&source.source_dir)
            .map_err(|error| read_error(&source.mod_id, error.path, error.source))?;
        let mut seen_in_mod = HashSet::<String>::new();

        for xml_file in xml_files {
            let raw = fs::read_to_string(&xml_file)
                .map_err(|source_err| read_error(&source.mod_id, xml_file.clone(), source_err))?;
            let defs = parse_defs_document(&source.mod_id, &xml_file, &raw)?;
            for def in defs {
                if !seen_in_mod.insert(def.def_name.clone()) {
                    return Err(ContentCompileError {
                        code: ContentErrorCode::DuplicateDefInMod,
                        message: format!(
                            "duplicate EntityDef '{}' in mod '{}'; each mod may define a defName only once",
                            def.def_name, source.mod_id
                        ),
                        mod_id: source.mod_id.clone(),
                        file_path: xml_file.clone(),
                        location: None,
                    });
                }
                merged.insert(def.def_name.clone(), def);
            }
        }
    }

    let entity_defs = merged
        .into_values()
        .map(|def| EntityArchetype {
            id: EntityDefId(0),
            def_name: def.def_name,
            label: def.label,
            renderable: def.renderable,
            hit_radius: def.hit_radius,
            tags: def.tags,
        })
        .collect::<Vec<_>>();

    Ok(DefDatabase::from_entity_defs(entity_defs))
}

fn parse_defs_document(
    mod_id: &str,
    file_path: &Path,
    raw: &str,
) -> Result<Vec<PendingEntityDef>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        mod_id: mod_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let ctx = NodeContext {
        mod_id,
        file_path,
        doc: &doc,
    };
    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            root,
        ));
    }

    root.children()
        .filter(|node| node.is_element())
        .map(|child| {
            if child.tag_name().name() != "EntityDef" {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownDefType,
                    format!(
                        "unsupported def type <{}>; only <EntityDef> is supported",
                        child.tag_name().name()
                    ),
                    child,
                ));
            }
            parse_entity_def(&ctx, child)
        })
        .collect()
}

struct NodeContext<'a, 'input> {
    mod_id: &'a str,
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl NodeContext<'_, '_> {
    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentCompileError {
            code,
            message,
            mod_id: self.mod_id.to_string(),
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn required_text(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<String, ContentCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("field <{}> must not be empty", field_name),
                node,
            ));
        }
        Ok(value)
    }
}

fn parse_entity_def(
    ctx: &NodeContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<PendingEntityDef, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut def_name: Option<String> = None;
    let mut label: Option<String> = None;
    let mut renderable: Option<RenderableKind> = None;
    let mut hit_radius: Option<f32> = None;
    let mut tags = Vec::<String>::new();

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(ctx.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{}> in <EntityDef>", field_name),
                field,
            ));
        }

        match field_name.as_str() {
            "defName" => def_name = Some(ctx.required_text(field, "defName")?),
            "label" => label = Some(ctx.required_text(field, "label")?),
            "renderable" => {
                let value = ctx.required_text(field, "renderable")?;
                renderable = Some(parse_renderable(ctx, field, &value)?);
            }
            "hitRadius" => {
                let value = ctx.required_text(field, "hitRadius")?;
                let parsed = value.parse::<f32>().map_err(|_| {
                    ctx.error_at(
                        ContentErrorCode::InvalidValue,
                        format!("hitRadius '{}' is not a valid number", value),
                        field,
                    )
                })?;
                if !parsed.is_finite() || parsed <= 0.0 {
                    return Err(ctx.error_at(
                        ContentErrorCode::InvalidValue,
                        "hitRadius must be finite and > 0".to_string(),
                        field,
                    ));
                }
                hit_radius = Some(parsed);
            }
            "tags" => tags = parse_tags(ctx, field)?,
            _ => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{}> in <EntityDef>", field_name),
                    field,
                ))
            }
        }
    }

    let missing = |name: &str| {
        ctx.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <{}> in <EntityDef>", name),
            node,
        )
    };
    let def_name = def_name.ok_or_else(|| missing("defName"))?;
    let label = label.ok_or_else(|| missing("label"))?;
    let renderable = renderable.ok_or_else(|| missing("renderable"))?;

    Ok(PendingEntityDef {
        def_name,
        label,
        renderable,
        hit_radius,
        tags,
    })
}

fn parse_renderable(
    ctx: &NodeContext<'_, '_>,
    field: Node<'_, '_>,
    value: &str,
) -> Result<RenderableKind, ContentCompileError> {
    if value == "Placeholder" {
        return Ok(RenderableKind::Placeholder);
    }
    match value.strip_prefix(MODEL_PREFIX).map(str::trim) {
        Some(key) if !key.is_empty() => Ok(RenderableKind::Model(key.to_string())),
        _ => Err(ctx.error_at(
            ContentErrorCode::InvalidValue,
            format!(
                "invalid renderable '{}'; allowed values: Placeholder, Model:<key>",
                value
            ),
            field,
        )),
    }
}

fn parse_tags(
    ctx: &NodeContext<'_, '_>,
    field: Node<'_, '_>,
) -> Result<Vec<String>, ContentCompileError> {
    let mut tags = Vec::<String>::new();
    for item in field.children().filter(|child| child.is_element()) {
        if item.tag_name().name() != "li" {
            return Err(ctx.error_at(
                ContentErrorCode::UnknownField,
                format!("unexpected <{}> in <tags>; use <li>", item.tag_name().name()),
                item,
            ));
        }
        let tag = ctx.required_text(item, "li")?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

struct ReadError {
    path: PathBuf,
    source: std::io::Error,
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_cached_key(|path| {
        normalize_rel_path(path.strip_prefix(root).unwrap_or(path.as_path()))
    });
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_error(mod_id: &str, path: PathBuf, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read content: {source}"),
        mod_id: mod_id.to_string(),
        file_path: path,
        location: None,
    }
}

fn map_discovery_error(error: DiscoveryError, root: &Path) -> ContentCompileError {
    let (mod_id, file_path, message) = match error {
        DiscoveryError::ModMissing {
            mod_id,
            expected_dir,
        } => {
            let message = format!(
                "enabled mod '{}' not found at {}; check enabled mod list",
                mod_id,
                expected_dir.display()
            );
            (mod_id, expected_dir, message)
        }
        DiscoveryError::DuplicateMod { mod_id } => (
            mod_id.clone(),
            root.to_path_buf(),
            format!("mod '{}' is enabled more than once", mod_id),
        ),
        DiscoveryError::EmptyModId => (
            "<discovery>".to_string(),
            root.to_path_buf(),
            "enabled mod id cannot be empty".to_string(),
        ),
    };
    ContentCompileError {
        code: ContentErrorCode::Discovery,
        message,
        mod_id,
        file_path,
        location: None,
    }
}
