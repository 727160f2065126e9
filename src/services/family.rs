use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    config::RootPolicy,
    models::member::{FamilyMember, MemberId, PersonDetail},
};

/// Upper bound on rows returned by a name search.
pub const SEARCH_LIMIT: i64 = 50;

/// Read access to the `family_members` relation.
#[async_trait]
pub trait FamilyStore: Send + Sync {
    /// Members that start a branch of the tree, ordered by `order_id`.
    async fn roots(&self) -> anyhow::Result<Vec<FamilyMember>>;

    /// Members whose father or mother is `parent_id`, minus the parent's own spouse.
    async fn children(&self, parent_id: MemberId) -> anyhow::Result<Vec<FamilyMember>>;

    async fn person(&self, id: MemberId) -> anyhow::Result<Option<PersonDetail>>;

    /// Case-insensitive literal substring match on `full_name`.
    async fn search(&self, needle: &str, limit: i64) -> anyhow::Result<Vec<FamilyMember>>;

    async fn ping(&self) -> anyhow::Result<()>;
}

pub struct PgFamilyStore {
    pool: PgPool,
    root_policy: RootPolicy,
}

impl PgFamilyStore {
    pub fn new(pool: PgPool, root_policy: RootPolicy) -> Self {
        Self { pool, root_policy }
    }
}

fn root_predicate(policy: RootPolicy) -> &'static str {
    match policy {
        RootPolicy::Structural => "father_id IS NULL AND mother_id IS NULL",
        RootPolicy::Flag => "is_root = TRUE",
    }
}

/// Escapes LIKE metacharacters so user input only ever matches literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl FamilyStore for PgFamilyStore {
    async fn roots(&self) -> anyhow::Result<Vec<FamilyMember>> {
        let predicate = root_predicate(self.root_policy);
        let roots = sqlx::query_as::<_, FamilyMember>(&format!(
            "SELECT id, full_name, photo_url, spouse_id, order_id
             FROM family_members
             WHERE {predicate}
             ORDER BY order_id, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(roots)
    }

    async fn children(&self, parent_id: MemberId) -> anyhow::Result<Vec<FamilyMember>> {
        let children = sqlx::query_as::<_, FamilyMember>(
            "SELECT c.id, c.full_name, c.photo_url, c.spouse_id, c.order_id
             FROM family_members c
             WHERE (c.father_id = $1 OR c.mother_id = $1)
               AND c.id IS DISTINCT FROM (
                   SELECT p.spouse_id FROM family_members p WHERE p.id = $1
               )
             ORDER BY c.order_id, c.id",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(children)
    }

    async fn person(&self, id: MemberId) -> anyhow::Result<Option<PersonDetail>> {
        let person = sqlx::query_as::<_, PersonDetail>(
            "SELECT fm.id, fm.full_name, fm.photo_url, fm.spouse_id, fm.order_id,
                    sp.full_name AS spouse_name,
                    sp.photo_url AS spouse_photo_url
             FROM family_members fm
             LEFT JOIN family_members sp ON sp.id = fm.spouse_id
             WHERE fm.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(person)
    }

    async fn search(&self, needle: &str, limit: i64) -> anyhow::Result<Vec<FamilyMember>> {
        let members = sqlx::query_as::<_, FamilyMember>(
            r"SELECT id, full_name, photo_url, spouse_id, order_id
              FROM family_members
              WHERE full_name ILIKE '%' || $1 || '%' ESCAPE '\'
              ORDER BY order_id, full_name
              LIMIT $2",
        )
        .bind(escape_like(needle))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::memory::{MemberRow, MemoryFamilyStore};
    use super::*;

    fn ids(members: &[FamilyMember]) -> Vec<MemberId> {
        members.iter().map(|m| m.id).collect()
    }

    #[test]
    fn escape_like_escapes_metacharacters() {
        assert_eq!(escape_like("Anna"), "Anna");
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
    }

    #[test]
    fn root_predicate_follows_policy() {
        assert!(root_predicate(RootPolicy::Structural).contains("father_id IS NULL"));
        assert_eq!(root_predicate(RootPolicy::Flag), "is_root = TRUE");
    }

    #[tokio::test]
    async fn single_root_with_one_child() {
        let store = MemoryFamilyStore::new(vec![
            MemberRow::new(1, "A", 1),
            MemberRow::new(2, "B", 1).father(1),
        ]);

        assert_eq!(ids(&store.roots().await.unwrap()), vec![1]);
        assert_eq!(ids(&store.children(1).await.unwrap()), vec![2]);
    }

    #[tokio::test]
    async fn flag_policy_ignores_parent_columns() {
        let store = MemoryFamilyStore::new(vec![
            MemberRow::new(1, "Orphan", 1),
            MemberRow::new(2, "Flagged", 2).father(1).root(),
        ])
        .with_root_policy(RootPolicy::Flag);

        assert_eq!(ids(&store.roots().await.unwrap()), vec![2]);
    }

    #[tokio::test]
    async fn children_exclude_the_parents_spouse() {
        let store = MemoryFamilyStore::new(vec![
            MemberRow::new(1, "Father", 1).spouse(2),
            MemberRow::new(2, "Mother", 2).spouse(1).father(1),
            MemberRow::new(3, "Second", 2).father(1).mother(2),
            MemberRow::new(4, "First", 1).mother(2),
        ]);

        assert_eq!(ids(&store.children(1).await.unwrap()), vec![3]);
        assert_eq!(ids(&store.children(2).await.unwrap()), vec![4, 3]);
    }

    #[tokio::test]
    async fn person_carries_spouse_details() {
        let store = MemoryFamilyStore::new(vec![
            MemberRow::new(1, "Joseph", 1).spouse(2),
            MemberRow::new(2, "Mary", 2).spouse(1).photo("https://img/mary.jpg"),
            MemberRow::new(3, "Widow", 3).spouse(99),
        ]);

        let joseph = store.person(1).await.unwrap().unwrap();
        assert_eq!(joseph.spouse_name.as_deref(), Some("Mary"));
        assert_eq!(joseph.spouse_photo_url.as_deref(), Some("https://img/mary.jpg"));

        let dangling = store.person(3).await.unwrap().unwrap();
        assert_eq!(dangling.spouse_id, Some(99));
        assert!(dangling.spouse_name.is_none());

        assert!(store.person(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_is_case_insensitive_ordered_and_capped() {
        let mut rows: Vec<_> = (1..=60)
            .map(|i| MemberRow::new(i, &format!("Thomas {i:02}"), 60 - i))
            .collect();
        rows.push(MemberRow::new(100, "Annamma", 0));

        let store = MemoryFamilyStore::new(rows);
        let found = store.search("THOMAS", SEARCH_LIMIT).await.unwrap();

        assert_eq!(found.len(), 50);
        assert!(found.iter().all(|m| m.full_name.to_lowercase().contains("thomas")));
        assert!(found.windows(2).all(|w| w[0].order_id <= w[1].order_id));
        assert_eq!(found[0].id, 60);
    }
}
