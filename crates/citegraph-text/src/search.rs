use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{Index, TantivyDocument};

pub struct TitleSearch {
    index: Index,
    searcher: tantivy::Searcher,
    id_field: tantivy::schema::Field,
    title_field: tantivy::schema::Field,
}

#[derive(Debug, Clone)]
pub struct TitleHit {
    pub id: String,
    pub score: f32,
}

impl TitleSearch {
    pub fn open(index_dir: std::path::PathBuf) -> Result<Self> {
        let index = Index::open_in_dir(&index_dir)?;
        crate::tantivy_utils::register_tokenizer(&index);
        let reader = index.reader()?;
        let searcher = reader.searcher();
        let schema = index.schema();
        let id_field = schema.get_field("id")?;
        let title_field = schema.get_field("title")?;
        Ok(Self { index, searcher, id_field, title_field })
    }

    pub fn search(&self, query_text: &str, limit: usize) -> Result<Vec<TitleHit>> {
        let query_parser = QueryParser::for_index(&self.index, vec![self.title_field]);
        let query = query_parser.parse_query(query_text)?;
        let top_docs = self.searcher.search(&query, &TopDocs::with_limit(limit))?;
        let mut hits = Vec::new();
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = self.searcher.doc(doc_address)?;
            let id = doc.get_first(self.id_field).and_then(|v| v.as_str()).unwrap_or("").to_string();
            hits.push(TitleHit { id, score });
        }
        Ok(hits)
    }
}
