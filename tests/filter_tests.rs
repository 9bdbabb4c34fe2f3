use anyhow::Result;
use places_explorer::domain::{NewVenue, VenueRecord};
use places_explorer::search::{FilterSelection, SearchIndex};
use places_explorer::storage::{CatalogStore, InMemoryStore};
use places_explorer::taxonomy::AGGREGATE_CATEGORY;
use std::sync::Arc;

async fn seeded_store() -> Result<InMemoryStore> {
    let store = InMemoryStore::new();
    let venues = [
        ("Бар", "BG", "Caffe", Some("кофейня на углу"), 44.81, 20.45),
        ("Бар", "NS", "Bar", None, 45.25, 19.84),
        ("Бар", "Mitrovica", "Caffe (BG)", Some("https://example.com"), 42.89, 20.86),
        ("Еда", "BG", "Grill House", Some("мясо на гриле"), 44.82, 20.46),
    ];
    for (category, city, name, description, lat, lng) in venues {
        store
            .create(NewVenue {
                name: name.to_string(),
                description: description.map(str::to_string),
                image_url: None,
                latitude: lat,
                longitude: lng,
                category_id: category.to_string(),
                city_id: city.to_string(),
            })
            .await?;
    }
    Ok(store)
}

async fn build_index(store: &InMemoryStore) -> Result<(SearchIndex, Vec<Arc<VenueRecord>>)> {
    let records: Vec<Arc<VenueRecord>> = store
        .list_all()
        .await?
        .into_iter()
        .map(Arc::new)
        .collect();
    Ok((SearchIndex::build(&records), records))
}

fn names(records: &[Arc<VenueRecord>]) -> Vec<String> {
    records.iter().map(|r| r.name.clone()).collect()
}

#[tokio::test]
async fn empty_selection_returns_input_unchanged() -> Result<()> {
    let store = seeded_store().await?;
    let (index, records) = build_index(&store).await?;

    let visible = index.visible(AGGREGATE_CATEGORY, &FilterSelection::default());
    assert_eq!(visible.len(), records.len());
    for (got, want) in visible.iter().zip(&records) {
        assert!(Arc::ptr_eq(got, want));
    }
    Ok(())
}

#[tokio::test]
async fn full_name_query_always_matches_its_record() -> Result<()> {
    let store = seeded_store().await?;
    let (index, _) = build_index(&store).await?;

    // Query the full lower-cased display name of one record.
    let selection = FilterSelection {
        query: "bg grill house".to_string(),
        ..Default::default()
    };
    let visible = index.visible(AGGREGATE_CATEGORY, &selection);
    assert_eq!(names(&visible), vec!["Grill House"]);
    Ok(())
}

#[tokio::test]
async fn city_filter_keeps_prefixed_and_parenthesized_matches() -> Result<()> {
    let store = seeded_store().await?;
    let (index, _) = build_index(&store).await?;

    // Display names in the bar partition:
    // "BG Caffe", "NS Bar", "Mitrovica Caffe (BG)"
    let selection = FilterSelection {
        city: Some("BG".to_string()),
        ..Default::default()
    };
    let visible = index.visible("Бар", &selection);
    assert_eq!(names(&visible), vec!["Caffe", "Caffe (BG)"]);
    Ok(())
}

#[tokio::test]
async fn category_partition_limits_the_search_scope() -> Result<()> {
    let store = seeded_store().await?;
    let (index, _) = build_index(&store).await?;

    // "гриле" only appears in the food record's description.
    let selection = FilterSelection {
        query: "гриле".to_string(),
        ..Default::default()
    };
    assert!(index.visible("Бар", &selection).is_empty());
    assert_eq!(names(&index.visible("Еда", &selection)), vec!["Grill House"]);
    assert_eq!(
        names(&index.visible(AGGREGATE_CATEGORY, &selection)),
        vec!["Grill House"]
    );
    Ok(())
}

#[tokio::test]
async fn rebuild_after_store_change_reflects_new_records() -> Result<()> {
    let store = seeded_store().await?;
    let (index, _) = build_index(&store).await?;
    let before = index.visible(AGGREGATE_CATEGORY, &FilterSelection::default());

    store
        .create(NewVenue {
            name: "Newcomer".to_string(),
            description: None,
            image_url: None,
            latitude: 44.99,
            longitude: 20.99,
            category_id: "Бар".to_string(),
            city_id: "BG".to_string(),
        })
        .await?;

    // The old index is untouched; a wholesale rebuild picks the record up.
    assert_eq!(
        index
            .visible(AGGREGATE_CATEGORY, &FilterSelection::default())
            .len(),
        before.len()
    );
    let (rebuilt, _) = build_index(&store).await?;
    assert_eq!(
        rebuilt
            .visible(AGGREGATE_CATEGORY, &FilterSelection::default())
            .len(),
        before.len() + 1
    );
    Ok(())
}

#[tokio::test]
async fn selection_matching_nothing_is_empty_not_an_error() -> Result<()> {
    let store = seeded_store().await?;
    let (index, _) = build_index(&store).await?;

    let selection = FilterSelection {
        city: Some("BG".to_string()),
        venue_type: Some("Еда".to_string()),
        query: "нигде не встречается".to_string(),
    };
    assert!(index.visible(AGGREGATE_CATEGORY, &selection).is_empty());
    Ok(())
}
