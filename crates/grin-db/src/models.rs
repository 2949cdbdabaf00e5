/// Database row types, mapped directly from SQLite rows.
/// Converted into `grin_types::ClassificationRecord` by the query layer.

pub struct HistoryRow {
    pub id: i64,
    pub image_path: String,
    pub class_name: String,
    pub upload_date: String,
}
