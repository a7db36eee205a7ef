//! JSON-in-zip backup/restore (spec §4.8): one JSON array per registered
//! type plus the built-in `tag` type, and an `_manifest.json` recording
//! the type order used at backup time.

use super::Store;
use crate::codec;
use crate::error::{ErrorClass, ErrorOrigin, RackError};
use crate::tag::{TagRecord, TAG_TYPE_NAME};
use std::io::{Read, Write};
use zip::write::SimpleFileOptions;

impl Store {
    /// Write `{name}.zip` (default name `"backup"`) into the store's
    /// configured backup directory and return its path.
    pub fn backup(&self, name: Option<&str>) -> Result<std::path::PathBuf, RackError> {
        let path = self.backup_dir.join(format!("{}.zip", name.unwrap_or("backup")));
        let file = std::fs::File::create(&path)?;
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut manifest: Vec<String> = self.registry.all_registered_types().iter().map(|s| (*s).to_string()).collect();
        manifest.push(TAG_TYPE_NAME.to_string());

        for type_name in self.registry.all_registered_types() {
            let prefix = format!("{type_name}_");
            let mut entries = Vec::new();
            for key in self.kv.iter_keys()? {
                if !key.starts_with(&prefix) {
                    continue;
                }
                let entry = self.fetch_plain(&key)?;
                entries.push(codec::encode(&entry));
            }
            entries.sort_by_key(|v| v.get("id").and_then(serde_json::Value::as_u64).unwrap_or(0));
            zip.start_file(format!("{type_name}.json"), options)?;
            zip.write_all(serde_json::to_string(&entries)?.as_bytes())?;
        }

        let mut tags = Vec::new();
        for key in self.kv.iter_keys()? {
            if !key.starts_with("tag_") {
                continue;
            }
            let raw = self.kv.get(&key)?.unwrap_or_default();
            let json: serde_json::Value = serde_json::from_slice(&raw)?;
            let tag = TagRecord::decode(&json)?;
            tags.push(tag.encode());
        }
        tags.sort_by(|a, b| {
            let name = |v: &serde_json::Value| v.get("name").and_then(serde_json::Value::as_str).unwrap_or("").to_string();
            name(a).cmp(&name(b))
        });
        zip.start_file(format!("{TAG_TYPE_NAME}.json"), options)?;
        zip.write_all(serde_json::to_string(&tags)?.as_bytes())?;

        zip.start_file("_manifest.json", options)?;
        zip.write_all(serde_json::to_string(&manifest)?.as_bytes())?;

        zip.finish()?;
        Ok(path)
    }

    /// Wipe the store and re-insert entries from `{name}.zip`, preserving
    /// canonical keys (no id reassignment). Rejects unknown-type members.
    pub fn restore(&self, name: Option<&str>) -> Result<(), RackError> {
        let path = self.backup_dir.join(format!("{}.zip", name.unwrap_or("backup")));
        let file = std::fs::File::open(&path)?;
        let mut archive = zip::ZipArchive::new(file)?;

        let manifest: Vec<String> = {
            let mut entry = archive.by_name("_manifest.json")?;
            let mut buf = String::new();
            entry.read_to_string(&mut buf)?;
            serde_json::from_str(&buf)?
        };

        for key in self.kv.iter_keys()? {
            self.kv.delete(&key)?;
        }

        for type_name in &manifest {
            if type_name != TAG_TYPE_NAME && !self.registry.is_registered(type_name) {
                return Err(RackError::new(
                    ErrorClass::Schema,
                    ErrorOrigin::Backup,
                    format!("unknown type '{type_name}' in backup archive"),
                ));
            }

            let members: Vec<serde_json::Value> = {
                let mut entry = archive.by_name(&format!("{type_name}.json"))?;
                let mut buf = String::new();
                entry.read_to_string(&mut buf)?;
                serde_json::from_str(&buf)?
            };

            for member in members {
                if type_name == TAG_TYPE_NAME {
                    let tag = TagRecord::decode(&member)?;
                    let key = tag.canonical_key();
                    self.kv.put(&key, serde_json::to_string(&tag.encode())?.as_bytes())?;
                } else {
                    let entry = codec::decode(&self.registry, &member)?;
                    let key = entry.canonical_key().ok_or_else(|| {
                        RackError::new(
                            ErrorClass::Field,
                            ErrorOrigin::Backup,
                            format!("archived '{type_name}' entry has no explicit id"),
                        )
                    })?;
                    self.kv.put(&key, serde_json::to_string(&codec::encode(&entry))?.as_bytes())?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Entry, Id};
    use crate::model::{EntityModel, FieldKind, FieldModel};
    use crate::store::{PutKey, StoreConfig};
    use crate::value::Value;
    use std::collections::BTreeMap;

    const BOOK_FIELDS: &[FieldModel] = &[FieldModel::required("title", FieldKind::String)];
    const BOOK: EntityModel = EntityModel {
        type_name: "book",
        fields: BOOK_FIELDS,
    };

    #[test]
    fn round_trip_preserves_items() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(StoreConfig::file(dir.path().join("db"), true)).unwrap();
        store.register(BOOK).unwrap();

        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), Value::String("A".into()));
        store.put(PutKey::Unique, Entry::new("book", Id::Auto, fields)).unwrap();
        store.make_once("hot", TagRecord::new("hot", Value::Bool(true))).unwrap();

        let before = store.items().unwrap();
        store.backup(Some("snap")).unwrap();
        store.restore(Some("snap")).unwrap();
        let after = store.items().unwrap();
        assert_eq!(before, after);
    }
}
