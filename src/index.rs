//! Collaborator interfaces for the remote side of the pipeline.
//!
//! The core pipeline ends at a serialized corpus plus a media
//! directory. Uploading assets, provisioning a search index, and
//! answering questions against it are external collaborators; this
//! module fixes their seams (traits, the index schema, the platform
//! batch limit) without shipping any network implementation.

use anyhow::Result;
use std::path::Path;

use crate::models::NormalizedRecord;

/// Documented platform limit: records are uploaded to the search index
/// in batches of at most this many.
pub const INDEX_BATCH_SIZE: usize = 100;

/// Field kinds understood by the index-provisioning collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    StringCollection,
    Timestamp,
}

/// One field of the search-index schema.
#[derive(Debug, Clone)]
pub struct IndexField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub key: bool,
    pub searchable: bool,
    pub filterable: bool,
    pub sortable: bool,
}

/// Schema derived 1:1 from the [`NormalizedRecord`] field list.
pub fn index_schema() -> Vec<IndexField> {
    fn field(name: &'static str, kind: FieldKind) -> IndexField {
        IndexField {
            name,
            kind,
            key: false,
            searchable: false,
            filterable: false,
            sortable: false,
        }
    }
    vec![
        IndexField {
            key: true,
            ..field("id", FieldKind::String)
        },
        IndexField {
            searchable: true,
            ..field("title", FieldKind::String)
        },
        IndexField {
            searchable: true,
            ..field("content", FieldKind::String)
        },
        IndexField {
            filterable: true,
            ..field("sourcePath", FieldKind::String)
        },
        IndexField {
            filterable: true,
            ..field("fileType", FieldKind::String)
        },
        IndexField {
            filterable: true,
            sortable: true,
            ..field("indexedDate", FieldKind::Timestamp)
        },
        field("images", FieldKind::StringCollection),
        field("audioFiles", FieldKind::StringCollection),
        field("videoFiles", FieldKind::StringCollection),
    ]
}

/// Blob-style asset upload: local path in, remote URL out.
pub trait AssetUploader {
    fn upload(&mut self, local: &Path) -> Result<String>;
}

/// Search-index provisioning and document upload.
pub trait SearchIndexClient {
    fn ensure_index(&mut self, schema: &[IndexField]) -> Result<()>;
    fn upload_batch(&mut self, batch: &[NormalizedRecord]) -> Result<()>;
}

/// One hit returned by the question-answering collaborator.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source_path: String,
    pub file_type: String,
    pub score: f64,
}

/// Free-text query against the provisioned index. The core does not
/// participate in ranking or answer synthesis.
pub trait QuestionClient {
    fn query(&mut self, text: &str) -> Result<Vec<SearchHit>>;
}

/// Provisions the index and uploads all records in platform-sized
/// batches, in corpus order.
pub fn push_corpus(client: &mut dyn SearchIndexClient, records: &[NormalizedRecord]) -> Result<()> {
    client.ensure_index(&index_schema())?;
    for batch in records.chunks(INDEX_BATCH_SIZE) {
        client.upload_batch(batch)?;
    }
    Ok(())
}

/// Replaces every local asset path on `record` with the URL returned by
/// the uploader, preserving list order.
pub fn rewrite_asset_paths(
    record: &mut NormalizedRecord,
    uploader: &mut dyn AssetUploader,
) -> Result<()> {
    for list in [
        &mut record.images,
        &mut record.audio_files,
        &mut record.video_files,
    ] {
        for entry in list.iter_mut() {
            *entry = uploader.upload(Path::new(entry))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileType;

    struct RecordingClient {
        ensured: bool,
        batch_sizes: Vec<usize>,
    }

    impl SearchIndexClient for RecordingClient {
        fn ensure_index(&mut self, schema: &[IndexField]) -> Result<()> {
            assert_eq!(schema.len(), 9);
            self.ensured = true;
            Ok(())
        }
        fn upload_batch(&mut self, batch: &[NormalizedRecord]) -> Result<()> {
            self.batch_sizes.push(batch.len());
            Ok(())
        }
    }

    struct FakeUploader;

    impl AssetUploader for FakeUploader {
        fn upload(&mut self, local: &Path) -> Result<String> {
            Ok(format!(
                "https://blobs.example/{}",
                local.file_name().unwrap().to_string_lossy()
            ))
        }
    }

    fn records(n: usize) -> Vec<NormalizedRecord> {
        (0..n)
            .map(|i| {
                let mut rec = NormalizedRecord::new(
                    Path::new(&format!("/docs/{}.md", i)),
                    FileType::Md,
                );
                rec.content = "x".to_string();
                rec
            })
            .collect()
    }

    #[test]
    fn schema_key_and_searchable_fields() {
        let schema = index_schema();
        let key: Vec<&str> = schema.iter().filter(|f| f.key).map(|f| f.name).collect();
        assert_eq!(key, vec!["id"]);
        let searchable: Vec<&str> = schema
            .iter()
            .filter(|f| f.searchable)
            .map(|f| f.name)
            .collect();
        assert_eq!(searchable, vec!["title", "content"]);
    }

    #[test]
    fn push_corpus_batches_at_platform_limit() {
        let mut client = RecordingClient {
            ensured: false,
            batch_sizes: Vec::new(),
        };
        push_corpus(&mut client, &records(250)).unwrap();
        assert!(client.ensured);
        assert_eq!(client.batch_sizes, vec![100, 100, 50]);
    }

    #[test]
    fn rewrite_swaps_local_paths_for_urls() {
        let mut rec = records(1).remove(0);
        rec.images.push("/out/media/a_image_1.png".to_string());
        rec.audio_files.push("/out/media/a_audio_1.mp3".to_string());
        rewrite_asset_paths(&mut rec, &mut FakeUploader).unwrap();
        assert_eq!(rec.images[0], "https://blobs.example/a_image_1.png");
        assert_eq!(rec.audio_files[0], "https://blobs.example/a_audio_1.mp3");
    }
}
