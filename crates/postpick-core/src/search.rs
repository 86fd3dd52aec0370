use crate::item::Item;

pub fn filter(items: &[Item], query: &str) -> Vec<Item> {
    filter_indices(items, query)
        .into_iter()
        .map(|index| items[index].clone())
        .collect()
}

pub fn filter_indices(items: &[Item], query: &str) -> Vec<usize> {
    let needle = fold(query);
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| needle.is_empty() || fold(&item.title).contains(&needle))
        .map(|(index, _)| index)
        .collect()
}

// Upper then lower so expansions like 'ß' -> "SS" fold the same way on both sides.
fn fold(value: &str) -> String {
    value.to_uppercase().to_lowercase()
}
