use super::CatalogStore;
use crate::{error::AppResult, models::NewBook};

/// Books loaded into an empty catalog on first start
pub fn sample_books() -> Vec<NewBook> {
    vec![
        NewBook::new(
            "The Shadow of the Wind",
            "Carlos Ruiz Zafón",
            "Mystery",
            "A magical tale set in a Barcelona book graveyard.",
        ),
        NewBook::new(
            "The Martian",
            "Andy Weir",
            "Sci-Fi",
            "An astronaut struggles to survive alone on Mars.",
        ),
        NewBook::new(
            "A Gentleman in Moscow",
            "Amor Towles",
            "Historical Fiction",
            "A count is sentenced to house arrest in a luxury hotel.",
        ),
        NewBook::new(
            "Project Hail Mary",
            "Andy Weir",
            "Sci-Fi",
            "A solitary survivor must save Earth from catastrophe.",
        ),
        NewBook::new(
            "Where the Crawdads Sing",
            "Delia Owens",
            "Mystery",
            "A girl raises herself in the marshes of North Carolina.",
        ),
        NewBook::new(
            "Sapiens: A Brief History of Humankind",
            "Yuval Noah Harari",
            "Non-Fiction",
            "A look at the history of humanity from early times to the present.",
        ),
    ]
}

/// Inserts the sample books if the catalog is empty
///
/// Returns how many books were inserted.
pub async fn seed_sample_books(catalog: &dyn CatalogStore) -> AppResult<usize> {
    if catalog.count_books().await? > 0 {
        tracing::debug!("Catalog already populated, skipping seed");
        return Ok(0);
    }

    let books = sample_books();
    for book in &books {
        catalog.insert_book(book).await?;
    }

    tracing::info!(count = books.len(), "Seeded sample catalog");

    Ok(books.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, SqliteStore};

    #[tokio::test]
    async fn test_seed_only_once() {
        let store = SqliteStore::new(create_pool("sqlite::memory:", 1).await.unwrap());

        assert_eq!(seed_sample_books(&store).await.unwrap(), 6);
        assert_eq!(seed_sample_books(&store).await.unwrap(), 0);
        assert_eq!(store.count_books().await.unwrap(), 6);
    }
}
