//! SQLite-backed implementation of ContentStore

use crate::StoreError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use storyloom_domain::traits::{ContentStore, ItemQuery, Versioned};
use storyloom_domain::{
    normalize_title, AdvisorId, ApprovalStatus, Confidence, Consultation, ConsultationId,
    ConsultationPriority, ConsultationStatus, ContentRef, ContentType, DocumentFormat, DocumentId,
    ExtractedItem, ExtractionStatus, ItemId, ItemKind, ItemStatus, Metric, Protocol, ProtocolId,
    ProviderScore, SensitivityAssessment, SensitivityTier, SourceDocument,
};

/// SQLite-based implementation of ContentStore
///
/// Entity ids are stored as 16-byte big-endian blobs so byte ordering
/// matches UUIDv7 chronological ordering. Optimistic locking is a
/// `version` column checked in the UPDATE's WHERE clause.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn id_bytes(value: u128) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    fn bytes_to_u128(bytes: &[u8]) -> Result<u128, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for id, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(u128::from_be_bytes(arr))
    }

    fn strings_to_json(strings: &[String]) -> Result<String, StoreError> {
        serde_json::to_string(strings)
            .map_err(|e| StoreError::InvalidData(format!("Failed to encode strings: {}", e)))
    }

    fn strings_from_json(json: &str) -> Result<Vec<String>, StoreError> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidData(format!("Failed to decode strings: {}", e)))
    }

    fn metrics_to_json(metrics: &[Metric]) -> Result<String, StoreError> {
        let values: Vec<serde_json::Value> = metrics
            .iter()
            .map(|m| serde_json::json!({"label": m.label, "value": m.value}))
            .collect();
        serde_json::to_string(&values)
            .map_err(|e| StoreError::InvalidData(format!("Failed to encode metrics: {}", e)))
    }

    fn metrics_from_json(json: &str) -> Result<Vec<Metric>, StoreError> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidData(format!("Failed to decode metrics: {}", e)))?;
        values
            .iter()
            .map(|v| {
                let label = v
                    .get("label")
                    .and_then(|l| l.as_str())
                    .ok_or_else(|| StoreError::InvalidData("Metric missing label".to_string()))?
                    .to_string();
                let value = v
                    .get("value")
                    .and_then(|l| l.as_str())
                    .ok_or_else(|| StoreError::InvalidData("Metric missing value".to_string()))?
                    .to_string();
                Ok(Metric { label, value })
            })
            .collect()
    }

    fn contributors_to_json(contributors: &[ProviderScore]) -> Result<String, StoreError> {
        let values: Vec<serde_json::Value> = contributors
            .iter()
            .map(|c| serde_json::json!({"provider": c.provider, "confidence": c.confidence.value()}))
            .collect();
        serde_json::to_string(&values)
            .map_err(|e| StoreError::InvalidData(format!("Failed to encode contributors: {}", e)))
    }

    fn contributors_from_json(json: &str) -> Result<Vec<ProviderScore>, StoreError> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| StoreError::InvalidData(format!("Failed to decode contributors: {}", e)))?;
        values
            .iter()
            .map(|v| {
                let provider = v
                    .get("provider")
                    .and_then(|p| p.as_str())
                    .ok_or_else(|| {
                        StoreError::InvalidData("Contributor missing provider".to_string())
                    })?
                    .to_string();
                let confidence = v
                    .get("confidence")
                    .and_then(|c| c.as_f64())
                    .ok_or_else(|| {
                        StoreError::InvalidData("Contributor missing confidence".to_string())
                    })?;
                Ok(ProviderScore {
                    provider,
                    confidence: Confidence::clamped(confidence),
                })
            })
            .collect()
    }

    fn assessments_for(&self, item_id: ItemId) -> Result<Vec<SensitivityAssessment>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT tier, requires_review, recommendations, provider, assessed_at
             FROM assessments WHERE item_id = ?1 ORDER BY seq",
        )?;

        let rows = stmt.query_map(params![Self::id_bytes(item_id.value())], |row| {
            let tier_str: String = row.get(0)?;
            let requires_review: bool = row.get(1)?;
            let recommendations_json: String = row.get(2)?;
            let provider: String = row.get(3)?;
            let assessed_at: i64 = row.get(4)?;
            Ok((
                tier_str,
                requires_review,
                recommendations_json,
                provider,
                assessed_at,
            ))
        })?;

        let mut assessments = Vec::new();
        for row in rows {
            let (tier_str, requires_review, recommendations_json, provider, assessed_at) = row?;
            let tier = SensitivityTier::parse(&tier_str)
                .ok_or_else(|| StoreError::InvalidData(format!("Unknown tier: {}", tier_str)))?;
            assessments.push(SensitivityAssessment {
                tier,
                requires_review,
                recommendations: Self::strings_from_json(&recommendations_json)?,
                provider,
                assessed_at: assessed_at as u64,
            });
        }

        Ok(assessments)
    }

    fn write_assessments(
        conn: &Connection,
        item_id: ItemId,
        assessments: &[SensitivityAssessment],
    ) -> Result<(), StoreError> {
        conn.execute(
            "DELETE FROM assessments WHERE item_id = ?1",
            params![Self::id_bytes(item_id.value())],
        )?;
        for (seq, assessment) in assessments.iter().enumerate() {
            conn.execute(
                "INSERT INTO assessments
                 (item_id, seq, tier, requires_review, recommendations, provider, assessed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    Self::id_bytes(item_id.value()),
                    seq as i64,
                    assessment.tier.as_str(),
                    assessment.requires_review,
                    Self::strings_to_json(&assessment.recommendations)?,
                    assessment.provider,
                    assessment.assessed_at as i64,
                ],
            )?;
        }
        Ok(())
    }

    fn insert_item_row(conn: &Connection, item: &ExtractedItem) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO items
             (id, document_id, kind, title, body, category, tags, metrics, cultural_note,
              confidence, contributors, status, created_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 1)",
            params![
                Self::id_bytes(item.id.value()),
                Self::id_bytes(item.document.value()),
                item.kind.as_str(),
                item.title,
                item.body,
                item.category,
                Self::strings_to_json(&item.tags)?,
                Self::metrics_to_json(&item.metrics)?,
                item.cultural_note,
                item.confidence.value(),
                Self::contributors_to_json(&item.contributors)?,
                item.status.as_str(),
                item.created_at as i64,
            ],
        )?;
        Self::write_assessments(conn, item.id, &item.assessments)
    }

    fn insert_consultation_row(
        conn: &Connection,
        consultation: &Consultation,
    ) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO consultations
             (id, content_type, content_id, purpose, priority, advisor_id, status, notes,
              recommendations, sensitivity_rating, approval, follow_up_required, parent_id,
              scheduled_at, completed_at, created_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, 1)",
            params![
                Self::id_bytes(consultation.id.value()),
                consultation.content.content_type.as_str(),
                Self::id_bytes(consultation.content.content_id),
                consultation.purpose,
                consultation.priority.as_str(),
                consultation.advisor.map(|a| Self::id_bytes(a.value())),
                consultation.status.as_str(),
                consultation.notes,
                Self::strings_to_json(&consultation.recommendations)?,
                consultation.sensitivity_rating,
                consultation.approval.as_str(),
                consultation.follow_up_required,
                consultation.parent.map(|p| Self::id_bytes(p.value())),
                consultation.scheduled_at.map(|t| t as i64),
                consultation.completed_at.map(|t| t as i64),
                consultation.created_at as i64,
            ],
        )?;
        Ok(())
    }

    fn item_from_row(row: &Row<'_>) -> rusqlite::Result<(ExtractedItem, u64)> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let document_bytes: Vec<u8> = row.get(1)?;
        let kind_str: String = row.get(2)?;
        let tags_json: String = row.get(6)?;
        let metrics_json: String = row.get(7)?;
        let contributors_json: String = row.get(10)?;
        let status_str: String = row.get(11)?;

        let convert = |e: StoreError| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        };

        let id = ItemId::from_value(Self::bytes_to_u128(&id_bytes).map_err(convert)?);
        let document =
            DocumentId::from_value(Self::bytes_to_u128(&document_bytes).map_err(convert)?);
        let kind = ItemKind::parse(&kind_str)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown kind: {}", kind_str)))
            .map_err(convert)?;
        let status = ItemStatus::parse(&status_str)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown status: {}", status_str)))
            .map_err(convert)?;

        let item = ExtractedItem {
            id,
            document,
            kind,
            title: row.get(3)?,
            body: row.get(4)?,
            category: row.get(5)?,
            tags: Self::strings_from_json(&tags_json).map_err(convert)?,
            metrics: Self::metrics_from_json(&metrics_json).map_err(convert)?,
            cultural_note: row.get(8)?,
            confidence: Confidence::clamped(row.get(9)?),
            contributors: Self::contributors_from_json(&contributors_json).map_err(convert)?,
            assessments: Vec::new(), // filled in by the caller
            status,
            created_at: row.get::<_, i64>(12)? as u64,
        };
        let version: i64 = row.get(13)?;

        Ok((item, version as u64))
    }

    fn consultation_from_row(row: &Row<'_>) -> rusqlite::Result<(Consultation, u64)> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let content_type_str: String = row.get(1)?;
        let content_id_bytes: Vec<u8> = row.get(2)?;
        let priority_str: String = row.get(4)?;
        let advisor_bytes: Option<Vec<u8>> = row.get(5)?;
        let status_str: String = row.get(6)?;
        let recommendations_json: String = row.get(8)?;
        let approval_str: String = row.get(10)?;
        let parent_bytes: Option<Vec<u8>> = row.get(12)?;

        let convert = |e: StoreError| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        };
        let parse_err =
            |what: &str, s: &str| StoreError::InvalidData(format!("Unknown {}: {}", what, s));

        let id = ConsultationId::from_value(Self::bytes_to_u128(&id_bytes).map_err(convert)?);
        let content_type = ContentType::parse(&content_type_str)
            .ok_or_else(|| parse_err("content type", &content_type_str))
            .map_err(convert)?;
        let content_id = Self::bytes_to_u128(&content_id_bytes).map_err(convert)?;
        let priority = ConsultationPriority::parse(&priority_str)
            .ok_or_else(|| parse_err("priority", &priority_str))
            .map_err(convert)?;
        let status = ConsultationStatus::parse(&status_str)
            .ok_or_else(|| parse_err("status", &status_str))
            .map_err(convert)?;
        let approval = ApprovalStatus::parse(&approval_str)
            .ok_or_else(|| parse_err("approval", &approval_str))
            .map_err(convert)?;

        let advisor = advisor_bytes
            .map(|b| Self::bytes_to_u128(&b).map(AdvisorId::from_value))
            .transpose()
            .map_err(convert)?;
        let parent = parent_bytes
            .map(|b| Self::bytes_to_u128(&b).map(ConsultationId::from_value))
            .transpose()
            .map_err(convert)?;

        let consultation = Consultation {
            id,
            content: ContentRef {
                content_type,
                content_id,
            },
            purpose: row.get(3)?,
            priority,
            advisor,
            status,
            notes: row.get(7)?,
            recommendations: Self::strings_from_json(&recommendations_json).map_err(convert)?,
            sensitivity_rating: row.get(9)?,
            approval,
            follow_up_required: row.get(11)?,
            parent,
            scheduled_at: row.get::<_, Option<i64>>(13)?.map(|t| t as u64),
            completed_at: row.get::<_, Option<i64>>(14)?.map(|t| t as u64),
            created_at: row.get::<_, i64>(15)? as u64,
        };
        let version: i64 = row.get(16)?;

        Ok((consultation, version as u64))
    }

    fn protocol_from_row(row: &Row<'_>) -> rusqlite::Result<Protocol> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let owners_json: String = row.get(3)?;
        let seasonal_json: String = row.get(5)?;
        let sharing_str: String = row.get(9)?;
        let validated_by_bytes: Vec<u8> = row.get(11)?;
        let supersedes_bytes: Option<Vec<u8>> = row.get(14)?;

        let convert = |e: StoreError| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        };

        let id = ProtocolId::from_value(Self::bytes_to_u128(&id_bytes).map_err(convert)?);
        let sharing = storyloom_domain::SharingPermission::parse(&sharing_str)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown sharing: {}", sharing_str)))
            .map_err(convert)?;
        let validated_by =
            AdvisorId::from_value(Self::bytes_to_u128(&validated_by_bytes).map_err(convert)?);
        let supersedes = supersedes_bytes
            .map(|b| Self::bytes_to_u128(&b).map(ProtocolId::from_value))
            .transpose()
            .map_err(convert)?;

        Ok(Protocol {
            id,
            story_title: row.get(1)?,
            story_type: row.get(2)?,
            traditional_owners: Self::strings_from_json(&owners_json).map_err(convert)?,
            origin: row.get(4)?,
            seasonal_restrictions: Self::strings_from_json(&seasonal_json).map_err(convert)?,
            gender_restriction: row.get(6)?,
            age_restriction: row.get(7)?,
            ceremonial_context: row.get(8)?,
            sharing,
            consultation_required: row.get(10)?,
            validated_by,
            validated_at: row.get::<_, i64>(12)? as u64,
            expires_at: row.get::<_, Option<i64>>(13)?.map(|t| t as u64),
            supersedes,
        })
    }

    const ITEM_COLUMNS: &'static str =
        "id, document_id, kind, title, body, category, tags, metrics, cultural_note,
         confidence, contributors, status, created_at, version";

    const CONSULTATION_COLUMNS: &'static str =
        "id, content_type, content_id, purpose, priority, advisor_id, status, notes,
         recommendations, sensitivity_rating, approval, follow_up_required, parent_id,
         scheduled_at, completed_at, created_at, version";

    const PROTOCOL_COLUMNS: &'static str =
        "id, story_title, story_type, traditional_owners, origin, seasonal_restrictions,
         gender_restriction, age_restriction, ceremonial_context, sharing,
         consultation_required, validated_by, validated_at, expires_at, supersedes";
}

impl ContentStore for SqliteStore {
    type Error = StoreError;

    fn insert_document(&mut self, document: SourceDocument) -> Result<DocumentId, Self::Error> {
        self.conn.execute(
            "INSERT INTO documents
             (id, filename, format, byte_size, uploaded_by, uploaded_at, status, failure_reason)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                Self::id_bytes(document.id.value()),
                document.filename,
                document.format.as_str(),
                document.byte_size as i64,
                document.uploaded_by,
                document.uploaded_at as i64,
                document.status.as_str(),
                document.failure_reason,
            ],
        )?;
        Ok(document.id)
    }

    fn get_document(&self, id: DocumentId) -> Result<Option<SourceDocument>, Self::Error> {
        let document = self
            .conn
            .query_row(
                "SELECT id, filename, format, byte_size, uploaded_by, uploaded_at, status,
                        failure_reason
                 FROM documents WHERE id = ?1",
                params![Self::id_bytes(id.value())],
                |row| {
                    let id_bytes: Vec<u8> = row.get(0)?;
                    let format_str: String = row.get(2)?;
                    let status_str: String = row.get(6)?;

                    let convert = |e: StoreError| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    };

                    let id =
                        DocumentId::from_value(Self::bytes_to_u128(&id_bytes).map_err(convert)?);
                    let format = DocumentFormat::parse(&format_str)
                        .ok_or_else(|| {
                            StoreError::InvalidData(format!("Unknown format: {}", format_str))
                        })
                        .map_err(convert)?;
                    let status = ExtractionStatus::parse(&status_str)
                        .ok_or_else(|| {
                            StoreError::InvalidData(format!("Unknown status: {}", status_str))
                        })
                        .map_err(convert)?;

                    Ok(SourceDocument {
                        id,
                        filename: row.get(1)?,
                        format,
                        byte_size: row.get::<_, i64>(3)? as u64,
                        uploaded_by: row.get(4)?,
                        uploaded_at: row.get::<_, i64>(5)? as u64,
                        status,
                        failure_reason: row.get(7)?,
                    })
                },
            )
            .optional()?;

        Ok(document)
    }

    fn set_document_status(
        &mut self,
        id: DocumentId,
        status: ExtractionStatus,
        failure_reason: Option<String>,
    ) -> Result<(), Self::Error> {
        let changed = self.conn.execute(
            "UPDATE documents SET status = ?2, failure_reason = ?3 WHERE id = ?1",
            params![
                Self::id_bytes(id.value()),
                status.as_str(),
                failure_reason
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("document {}", id)));
        }
        Ok(())
    }

    fn insert_item_with_consultation(
        &mut self,
        item: ExtractedItem,
        consultation: Option<Consultation>,
    ) -> Result<ItemId, Self::Error> {
        let tx = self.conn.transaction()?;
        Self::insert_item_row(&tx, &item)?;
        if let Some(consultation) = &consultation {
            Self::insert_consultation_row(&tx, consultation)?;
        }
        tx.commit()?;
        Ok(item.id)
    }

    fn get_item(&self, id: ItemId) -> Result<Option<Versioned<ExtractedItem>>, Self::Error> {
        let found = self
            .conn
            .query_row(
                &format!("SELECT {} FROM items WHERE id = ?1", Self::ITEM_COLUMNS),
                params![Self::id_bytes(id.value())],
                Self::item_from_row,
            )
            .optional()?;

        match found {
            Some((mut item, version)) => {
                item.assessments = self.assessments_for(item.id)?;
                Ok(Some(Versioned {
                    value: item,
                    version,
                }))
            }
            None => Ok(None),
        }
    }

    fn update_item(
        &mut self,
        item: ExtractedItem,
        expected_version: u64,
    ) -> Result<u64, Self::Error> {
        let tx = self.conn.transaction()?;

        let changed = tx.execute(
            "UPDATE items SET title = ?2, body = ?3, category = ?4, tags = ?5, metrics = ?6,
                              cultural_note = ?7, confidence = ?8, contributors = ?9,
                              status = ?10, version = version + 1
             WHERE id = ?1 AND version = ?11",
            params![
                Self::id_bytes(item.id.value()),
                item.title,
                item.body,
                item.category,
                Self::strings_to_json(&item.tags)?,
                Self::metrics_to_json(&item.metrics)?,
                item.cultural_note,
                item.confidence.value(),
                Self::contributors_to_json(&item.contributors)?,
                item.status.as_str(),
                expected_version as i64,
            ],
        )?;

        if changed == 0 {
            let actual: Option<i64> = tx
                .query_row(
                    "SELECT version FROM items WHERE id = ?1",
                    params![Self::id_bytes(item.id.value())],
                    |row| row.get(0),
                )
                .optional()?;
            return match actual {
                Some(actual) => Err(StoreError::VersionConflict {
                    entity: format!("item {}", item.id),
                    expected: expected_version,
                    actual: actual as u64,
                }),
                None => Err(StoreError::NotFound(format!("item {}", item.id))),
            };
        }

        Self::write_assessments(&tx, item.id, &item.assessments)?;
        tx.commit()?;
        Ok(expected_version + 1)
    }

    fn query_items(&self, query: &ItemQuery) -> Result<Vec<ExtractedItem>, Self::Error> {
        let mut sql = format!(
            "SELECT {} FROM items WHERE 1=1",
            Self::ITEM_COLUMNS
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(document) = query.document {
            sql.push_str(" AND document_id = ?");
            params_vec.push(Box::new(Self::id_bytes(document.value())));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params_vec.push(Box::new(status.as_str().to_string()));
        }
        if let Some(min_confidence) = query.min_confidence {
            sql.push_str(" AND confidence >= ?");
            params_vec.push(Box::new(min_confidence));
        }

        sql.push_str(" ORDER BY id");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params_vec.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(&param_refs[..], Self::item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut items = Vec::with_capacity(rows.len());
        for (mut item, _version) in rows {
            item.assessments = self.assessments_for(item.id)?;
            items.push(item);
        }

        Ok(items)
    }

    fn insert_consultation(
        &mut self,
        consultation: Consultation,
    ) -> Result<ConsultationId, Self::Error> {
        Self::insert_consultation_row(&self.conn, &consultation)?;
        Ok(consultation.id)
    }

    fn get_consultation(
        &self,
        id: ConsultationId,
    ) -> Result<Option<Versioned<Consultation>>, Self::Error> {
        let found = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM consultations WHERE id = ?1",
                    Self::CONSULTATION_COLUMNS
                ),
                params![Self::id_bytes(id.value())],
                Self::consultation_from_row,
            )
            .optional()?;

        Ok(found.map(|(consultation, version)| Versioned {
            value: consultation,
            version,
        }))
    }

    fn update_consultation(
        &mut self,
        consultation: Consultation,
        expected_version: u64,
    ) -> Result<u64, Self::Error> {
        let changed = self.conn.execute(
            "UPDATE consultations
             SET priority = ?2, advisor_id = ?3, status = ?4, notes = ?5, recommendations = ?6,
                 sensitivity_rating = ?7, approval = ?8, follow_up_required = ?9,
                 scheduled_at = ?10, completed_at = ?11, version = version + 1
             WHERE id = ?1 AND version = ?12",
            params![
                Self::id_bytes(consultation.id.value()),
                consultation.priority.as_str(),
                consultation.advisor.map(|a| Self::id_bytes(a.value())),
                consultation.status.as_str(),
                consultation.notes,
                Self::strings_to_json(&consultation.recommendations)?,
                consultation.sensitivity_rating,
                consultation.approval.as_str(),
                consultation.follow_up_required,
                consultation.scheduled_at.map(|t| t as i64),
                consultation.completed_at.map(|t| t as i64),
                expected_version as i64,
            ],
        )?;

        if changed == 0 {
            let actual: Option<i64> = self
                .conn
                .query_row(
                    "SELECT version FROM consultations WHERE id = ?1",
                    params![Self::id_bytes(consultation.id.value())],
                    |row| row.get(0),
                )
                .optional()?;
            return match actual {
                Some(actual) => Err(StoreError::VersionConflict {
                    entity: format!("consultation {}", consultation.id),
                    expected: expected_version,
                    actual: actual as u64,
                }),
                None => Err(StoreError::NotFound(format!(
                    "consultation {}",
                    consultation.id
                ))),
            };
        }

        Ok(expected_version + 1)
    }

    fn consultations_for(&self, content: &ContentRef) -> Result<Vec<Consultation>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM consultations
             WHERE content_type = ?1 AND content_id = ?2 ORDER BY id",
            Self::CONSULTATION_COLUMNS
        ))?;

        let rows = stmt
            .query_map(
                params![
                    content.content_type.as_str(),
                    Self::id_bytes(content.content_id)
                ],
                Self::consultation_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows.into_iter().map(|(c, _)| c).collect())
    }

    fn insert_protocol(&mut self, protocol: Protocol) -> Result<ProtocolId, Self::Error> {
        self.conn.execute(
            "INSERT INTO protocols
             (id, story_title, normalized_title, story_type, traditional_owners, origin,
              seasonal_restrictions, gender_restriction, age_restriction, ceremonial_context,
              sharing, consultation_required, validated_by, validated_at, expires_at, supersedes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                Self::id_bytes(protocol.id.value()),
                protocol.story_title,
                normalize_title(&protocol.story_title),
                protocol.story_type,
                Self::strings_to_json(&protocol.traditional_owners)?,
                protocol.origin,
                Self::strings_to_json(&protocol.seasonal_restrictions)?,
                protocol.gender_restriction,
                protocol.age_restriction,
                protocol.ceremonial_context,
                protocol.sharing.as_str(),
                protocol.consultation_required,
                Self::id_bytes(protocol.validated_by.value()),
                protocol.validated_at as i64,
                protocol.expires_at.map(|t| t as i64),
                protocol.supersedes.map(|p| Self::id_bytes(p.value())),
            ],
        )?;
        Ok(protocol.id)
    }

    fn protocols_for_title(&self, normalized: &str) -> Result<Vec<Protocol>, Self::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM protocols WHERE normalized_title = ?1 ORDER BY id",
            Self::PROTOCOL_COLUMNS
        ))?;

        let protocols = stmt
            .query_map(params![normalized], Self::protocol_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(protocols)
    }
}
