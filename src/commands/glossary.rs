use crate::models::ArticleLink;
use crate::services::glossary_service::{self, Glossary};
use crate::services::llm_client::LlmClient;
use crate::Result;

/// Terms from a single article.
pub async fn read_article(link: &str) -> Result<Glossary> {
    let llm = LlmClient::from_config()?;
    let mut glossary = Glossary::new();
    glossary_service::read_article(&llm, &mut glossary, link).await?;
    Ok(glossary)
}

/// Find up to `max_articles` pages about `topic` and collect their terms.
/// A page the model cannot summarise is skipped.
pub async fn study_topic(topic: &str, max_articles: usize) -> Result<(Vec<ArticleLink>, Glossary)> {
    let llm = LlmClient::from_config()?;
    let mut articles = glossary_service::find_articles(&llm, topic).await?;
    articles.truncate(max_articles);

    let mut glossary = Glossary::new();
    for article in &articles {
        if let Err(e) = glossary_service::read_article(&llm, &mut glossary, &article.url).await {
            tracing::warn!(url = %article.url, error = %e, "skipping article");
        }
    }
    Ok((articles, glossary))
}
