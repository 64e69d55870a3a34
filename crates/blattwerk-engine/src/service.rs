// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document service — runs one operation end to end: admission, validation,
// dispatch into the pipeline, and result packaging.

use std::time::Instant;

use blattwerk_admission::{Admission, AdmissionController};
use blattwerk_core::config::EngineConfig;
use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::{ArchiveNaming, PermissionProfile, RasterFormat, RequestId};
use blattwerk_document::pdf::{assemble, codec, ranges, recompress, security};
use blattwerk_document::{archive, raster};
use tracing::{info, instrument};

use crate::request::{Operation, OperationMetrics, OperationOutput, OutputKind};

/// Front door of the pipeline. One instance serves all clients; the
/// admission controller inside it is the shared rate-limit state.
#[derive(Debug)]
pub struct DocumentService {
    admission: AdmissionController,
    config: EngineConfig,
}

impl DocumentService {
    pub fn new(config: EngineConfig) -> Self {
        let admission = AdmissionController::new(
            config.admission_idle_ttl(),
            config.admission_sweep_threshold,
        );
        Self { admission, config }
    }

    /// Run one operation for `client`.
    ///
    /// Admission is checked before anything else, so a rate-limited client
    /// costs no parsing work. Validation failures surface before the
    /// pipeline runs; multi-buffer results (split parts, rendered pages)
    /// are packaged into a zip archive.
    #[instrument(skip(self, operation), fields(client, endpoint = operation.endpoint()))]
    pub fn handle(&self, client: &str, operation: Operation) -> Result<OperationOutput> {
        let endpoint = operation.endpoint();
        if self.admission.try_admit(client, endpoint) == Admission::Rejected {
            return Err(BlattwerkError::RateLimited {
                endpoint: endpoint.to_string(),
            });
        }

        let started = Instant::now();
        let request_id = RequestId::new();
        let input_bytes = operation.input_bytes();

        let (kind, bytes, buffer_count) = self.dispatch(operation)?;

        let metrics = OperationMetrics {
            input_bytes,
            output_bytes: bytes.len(),
            buffer_count,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            %request_id,
            input_bytes = metrics.input_bytes,
            output_bytes = metrics.output_bytes,
            buffers = metrics.buffer_count,
            elapsed_ms = metrics.elapsed_ms,
            "Operation complete"
        );

        Ok(OperationOutput {
            request_id,
            kind,
            bytes,
            metrics,
        })
    }

    fn dispatch(&self, operation: Operation) -> Result<(OutputKind, Vec<u8>, usize)> {
        match operation {
            Operation::Unlock { file, password } => {
                self.check_payload(&file)?;
                check_password(&password)?;
                let output = security::unlock(&file, &password)?;
                Ok((OutputKind::Pdf, output, 1))
            }

            Operation::Lock {
                file,
                password,
                owner_password,
            } => {
                self.check_payload(&file)?;
                check_password(&password)?;
                if codec::open(&file)?.is_encrypted() {
                    return Err(BlattwerkError::AlreadyEncrypted);
                }

                match security::lock(
                    &file,
                    &password,
                    owner_password.as_deref(),
                    PermissionProfile::standard(),
                ) {
                    Ok(output) => Ok((OutputKind::Pdf, output, 1)),
                    // The pre-check above saw an unprotected document; the
                    // operation disagreeing means the two checks diverged.
                    Err(BlattwerkError::AlreadyEncrypted) => Err(BlattwerkError::InvariantViolation(
                        "encryption pre-check and lock disagree".to_string(),
                    )),
                    Err(other) => Err(other),
                }
            }

            Operation::Split { file, ranges: expression } => {
                self.check_payload(&file)?;
                if expression.trim().is_empty() {
                    return Err(BlattwerkError::InvalidInput(
                        "page range expression is empty".to_string(),
                    ));
                }

                let total_pages = codec::page_count(&codec::open(&file)?);
                let resolved = ranges::resolve(&expression, total_pages)?;
                let parts = assemble::split(&file, &resolved)?;
                if parts.is_empty() {
                    return Err(BlattwerkError::InvalidInput(
                        "no pages matched the requested ranges".to_string(),
                    ));
                }

                let part_count = parts.len();
                let packed = archive::pack(&parts, ArchiveNaming::SplitPdf)?;
                Ok((OutputKind::Archive, packed, part_count))
            }

            Operation::Merge { files } => {
                for file in &files {
                    self.check_payload(file)?;
                }
                let output = assemble::merge(&files)?;
                Ok((OutputKind::Pdf, output, 1))
            }

            Operation::Rasterize { file, format, dpi } => {
                self.check_payload(&file)?;
                let format = RasterFormat::parse(&format)?;
                let pages = raster::rasterize(&file, format, dpi)?;
                if pages.is_empty() {
                    return Err(BlattwerkError::InvalidInput(
                        "no pages found in document".to_string(),
                    ));
                }

                let page_count = pages.len();
                let packed = archive::pack(&pages, ArchiveNaming::PageImage(format))?;
                Ok((OutputKind::Archive, packed, page_count))
            }

            Operation::Recompress { file, quality } => {
                self.check_payload(&file)?;
                let output = recompress::recompress(&file, quality)?;
                Ok((OutputKind::Pdf, output, 1))
            }
        }
    }

    /// Structural gate every uploaded document passes before parsing.
    fn check_payload(&self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Err(BlattwerkError::InvalidInput("file is empty".to_string()));
        }
        if bytes.len() > self.config.max_upload_bytes() {
            return Err(BlattwerkError::InvalidInput(format!(
                "file exceeds the {} MB upload limit",
                self.config.max_upload_mb
            )));
        }
        if !codec::looks_like_pdf(bytes) {
            return Err(BlattwerkError::InvalidInput(
                "file is not a PDF document".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_password(password: &str) -> Result<()> {
    if password.trim().is_empty() {
        return Err(BlattwerkError::InvalidInput(
            "password must not be blank".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation as PdfOp};
    use lopdf::{Dictionary, Document, Object, Stream, dictionary};
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn service() -> DocumentService {
        DocumentService::new(EngineConfig::default())
    }

    fn test_pdf(num_pages: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for i in 0..num_pages {
            let content = Content {
                operations: vec![
                    PdfOp::new("BT", vec![]),
                    PdfOp::new(
                        "Tf",
                        vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                    ),
                    PdfOp::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                    PdfOp::new(
                        "Tj",
                        vec![Object::String(
                            format!("Page {}", i + 1).into_bytes(),
                            lopdf::StringFormat::Literal,
                        )],
                    ),
                    PdfOp::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => Object::Reference(content_id),
            });
            page_ids.push(page_id);
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(num_pages as i64),
            "Kids" => Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        // Encryption (exercised by the lock tests) requires a file /ID in
        // the trailer; lopdf does not generate one on save.
        doc.trailer.set(
            "ID",
            Object::Array(vec![
                Object::String(vec![0x42; 16], lopdf::StringFormat::Hexadecimal),
                Object::String(vec![0x42; 16], lopdf::StringFormat::Hexadecimal),
            ]),
        );

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn split_returns_an_archive_of_parts() {
        let service = service();
        let output = service
            .handle(
                "10.0.0.1",
                Operation::Split {
                    file: test_pdf(5),
                    ranges: "1-2,4".to_string(),
                },
            )
            .unwrap();

        assert_eq!(output.kind, OutputKind::Archive);
        assert_eq!(output.metrics.buffer_count, 2);

        let mut archive = ZipArchive::new(Cursor::new(output.bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), "split_page_1.pdf");

        let mut part = Vec::new();
        archive.by_index(0).unwrap().read_to_end(&mut part).unwrap();
        assert_eq!(Document::load_mem(&part).unwrap().get_pages().len(), 2);
    }

    #[test]
    fn merge_returns_a_single_pdf() {
        let service = service();
        let output = service
            .handle(
                "10.0.0.1",
                Operation::Merge {
                    files: vec![test_pdf(2), test_pdf(3)],
                },
            )
            .unwrap();

        assert_eq!(output.kind, OutputKind::Pdf);
        assert_eq!(
            Document::load_mem(&output.bytes).unwrap().get_pages().len(),
            5
        );
    }

    #[test]
    fn lock_then_unlock_round_trips() {
        let service = service();
        let original = test_pdf(2);

        let locked = service
            .handle(
                "10.0.0.1",
                Operation::Lock {
                    file: original.clone(),
                    password: "secret".to_string(),
                    owner_password: None,
                },
            )
            .unwrap();
        assert!(Document::load_mem(&locked.bytes).unwrap().is_encrypted());

        let unlocked = service
            .handle(
                "10.0.0.1",
                Operation::Unlock {
                    file: locked.bytes,
                    password: "secret".to_string(),
                },
            )
            .unwrap();
        let document = Document::load_mem(&unlocked.bytes).unwrap();
        assert!(!document.is_encrypted());
        assert_eq!(document.get_pages().len(), 2);
    }

    #[test]
    fn lock_of_a_protected_document_is_a_state_error() {
        let service = service();
        let locked = service
            .handle(
                "10.0.0.1",
                Operation::Lock {
                    file: test_pdf(1),
                    password: "secret".to_string(),
                    owner_password: None,
                },
            )
            .unwrap();

        let err = service
            .handle(
                "10.0.0.1",
                Operation::Lock {
                    file: locked.bytes,
                    password: "other".to_string(),
                    owner_password: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, BlattwerkError::AlreadyEncrypted));
    }

    #[test]
    fn blank_password_is_rejected_before_any_parsing() {
        let service = service();
        let err = service
            .handle(
                "10.0.0.1",
                Operation::Lock {
                    file: test_pdf(1),
                    password: "   ".to_string(),
                    owner_password: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, BlattwerkError::InvalidInput(_)));
    }

    #[test]
    fn non_pdf_payloads_are_rejected() {
        let service = service();
        let err = service
            .handle(
                "10.0.0.1",
                Operation::Split {
                    file: b"plain text".to_vec(),
                    ranges: "1".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, BlattwerkError::InvalidInput(_)));
    }

    #[test]
    fn empty_range_expression_is_rejected() {
        let service = service();
        let err = service
            .handle(
                "10.0.0.1",
                Operation::Split {
                    file: test_pdf(3),
                    ranges: "  ".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, BlattwerkError::InvalidInput(_)));
    }

    #[test]
    fn oversized_uploads_are_rejected() {
        let config = EngineConfig {
            max_upload_mb: 0,
            ..EngineConfig::default()
        };
        let service = DocumentService::new(config);

        let err = service
            .handle(
                "10.0.0.1",
                Operation::Recompress {
                    file: test_pdf(1),
                    quality: 0.5,
                },
            )
            .unwrap_err();
        assert!(matches!(err, BlattwerkError::InvalidInput(_)));
    }

    #[test]
    fn exhausted_budget_surfaces_as_rate_limited() {
        let service = service();
        let pdf = test_pdf(1);

        // The lock endpoint admits 5 requests per window.
        let mut outcomes = Vec::new();
        for _ in 0..6 {
            outcomes.push(service.handle(
                "10.0.0.9",
                Operation::Lock {
                    file: pdf.clone(),
                    password: "secret".to_string(),
                    owner_password: None,
                },
            ));
        }

        assert!(matches!(
            outcomes.pop().unwrap().unwrap_err(),
            BlattwerkError::RateLimited { .. }
        ));
    }

    #[test]
    fn rasterize_packs_one_entry_per_page() {
        let service = service();
        let output = service
            .handle(
                "10.0.0.1",
                Operation::Rasterize {
                    file: test_pdf(3),
                    format: "png".to_string(),
                    dpi: 72,
                },
            )
            .unwrap();

        assert_eq!(output.kind, OutputKind::Archive);
        let mut archive = ZipArchive::new(Cursor::new(output.bytes)).unwrap();
        assert_eq!(archive.len(), 3);
        assert_eq!(archive.by_index(0).unwrap().name(), "page_1.png");
        assert_eq!(archive.by_index(2).unwrap().name(), "page_3.png");
    }

    #[test]
    fn unknown_raster_format_is_rejected() {
        let service = service();
        let err = service
            .handle(
                "10.0.0.1",
                Operation::Rasterize {
                    file: test_pdf(1),
                    format: "tiff".to_string(),
                    dpi: 150,
                },
            )
            .unwrap_err();
        assert!(matches!(err, BlattwerkError::UnsupportedFormat(_)));
    }

    #[test]
    fn recompress_keeps_the_page_count() {
        let service = service();
        let output = service
            .handle(
                "10.0.0.1",
                Operation::Recompress {
                    file: test_pdf(4),
                    quality: 0.7,
                },
            )
            .unwrap();

        assert_eq!(output.kind, OutputKind::Pdf);
        assert_eq!(
            Document::load_mem(&output.bytes).unwrap().get_pages().len(),
            4
        );
    }

    #[test]
    fn metrics_report_sizes_and_buffers() {
        let service = service();
        let pdf = test_pdf(2);
        let input_len = pdf.len();

        let output = service
            .handle(
                "10.0.0.1",
                Operation::Split {
                    file: pdf,
                    ranges: "1,2".to_string(),
                },
            )
            .unwrap();

        assert_eq!(output.metrics.input_bytes, input_len);
        assert_eq!(output.metrics.output_bytes, output.bytes.len());
        assert_eq!(output.metrics.buffer_count, 2);
    }
}
