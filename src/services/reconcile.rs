// src/services/reconcile.rs
//
// Decide o destino de cada filha numa atualização de agregado.

use std::collections::HashSet;

use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

/// Item de uma coleção de filhas enviada pelo cliente.
pub trait Reconcilable {
    /// Nome da lista no payload, usado nos erros de validação.
    const FIELD: &'static str;

    fn id(&self) -> Option<Uuid>;

    /// Chave que não pode repetir dentro do mesmo pai (ex.: `rule_id`).
    fn natural_key(&self) -> Option<String> {
        None
    }
}

#[derive(Debug)]
pub struct Plan<T> {
    /// Ids gravados que não vieram na submissão, na ordem gravada.
    pub delete: Vec<Uuid>,
    /// Itens com id gravado, na ordem submetida.
    pub update: Vec<T>,
    /// Itens sem id (ou com id desconhecido); recebem id novo.
    pub insert: Vec<T>,
}

fn repeated<T: Reconcilable>(code: &'static str, message: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(T::FIELD, ValidationError::new(code).with_message(message.into()));
    errors
}

/// Submissões com id gravado repetido ou chave natural repetida são recusadas inteiras.
pub fn plan<T: Reconcilable>(existing: &[Uuid], submitted: Vec<T>) -> Result<Plan<T>, ValidationErrors> {
    let stored: HashSet<Uuid> = existing.iter().copied().collect();
    let mut claimed = HashSet::new();
    let mut keys = HashSet::new();
    let mut update = Vec::new();
    let mut insert = Vec::new();

    for item in submitted {
        if let Some(key) = item.natural_key() {
            if !keys.insert(key) {
                return Err(repeated::<T>("duplicate_key", "A lista contém itens repetidos."));
            }
        }

        match item.id() {
            Some(id) if stored.contains(&id) => {
                if !claimed.insert(id) {
                    return Err(repeated::<T>("duplicate_id", "O mesmo item foi enviado mais de uma vez."));
                }
                update.push(item);
            }
            _ => insert.push(item),
        }
    }

    let delete = existing
        .iter()
        .copied()
        .filter(|id| !claimed.contains(id))
        .collect();

    Ok(Plan { delete, update, insert })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: Option<Uuid>,
        key: Option<&'static str>,
    }

    impl Reconcilable for Item {
        const FIELD: &'static str = "itemList";

        fn id(&self) -> Option<Uuid> {
            self.id
        }

        fn natural_key(&self) -> Option<String> {
            self.key.map(str::to_string)
        }
    }

    fn item(id: Option<Uuid>, key: &'static str) -> Item {
        Item { id, key: Some(key) }
    }

    #[test]
    fn splits_into_delete_update_insert() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let plan = plan(&[a, b, c], vec![item(Some(b), "b"), item(None, "novo")]).unwrap();

        assert_eq!(plan.delete, vec![a, c]);
        assert_eq!(plan.update, vec![item(Some(b), "b")]);
        assert_eq!(plan.insert, vec![item(None, "novo")]);
    }

    #[test]
    fn empty_submission_deletes_everything() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let plan = plan::<Item>(&[a, b], vec![]).unwrap();

        assert_eq!(plan.delete, vec![a, b]);
        assert!(plan.update.is_empty());
        assert!(plan.insert.is_empty());
    }

    #[test]
    fn unknown_ids_become_inserts() {
        let foreign = Uuid::new_v4();

        let plan = plan(&[], vec![item(Some(foreign), "x")]).unwrap();

        assert_eq!(plan.insert.len(), 1);
        assert!(plan.update.is_empty());
    }

    #[test]
    fn repeated_stored_id_is_rejected() {
        let a = Uuid::new_v4();

        let errors = plan(&[a], vec![item(Some(a), "1"), item(Some(a), "2")]).unwrap_err();

        assert!(errors.field_errors().contains_key("itemList"));
    }

    #[test]
    fn duplicate_natural_keys_are_rejected() {
        let a = Uuid::new_v4();

        assert!(plan(&[a], vec![item(None, "r1"), item(Some(a), "r1")]).is_err());
        assert!(plan(&[], vec![item(None, "r2"), item(None, "r2")]).is_err());
    }

    #[test]
    fn stored_rows_sharing_a_key_are_never_silently_deleted() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let errors = plan(&[a, b], vec![item(Some(a), "r1"), item(Some(b), "r1")]).unwrap_err();

        let field = &errors.field_errors()["itemList"];
        assert_eq!(field[0].code, "duplicate_key");
    }

    #[test]
    fn items_without_key_are_never_deduplicated() {
        let items = vec![Item { id: None, key: None }, Item { id: None, key: None }];

        let plan = plan(&[], items).unwrap();

        assert_eq!(plan.insert.len(), 2);
    }
}
