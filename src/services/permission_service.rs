// src/services/permission_service.rs

use std::collections::BTreeMap;

use crate::{
    common::error::AppError,
    db::PermissionRepository,
    models::{
        auth::Principal,
        menu::{Capabilities, Capability, Menu, MenuGrant},
    },
};

#[derive(Clone)]
pub struct PermissionService {
    repo: PermissionRepository,
}

impl PermissionService {
    pub fn new(repo: PermissionRepository) -> Self {
        Self { repo }
    }

    /// Menus que o usuário alcança, com os bits efetivos.
    pub async fn resolve(&self, principal: &Principal) -> Result<Vec<MenuGrant>, AppError> {
        if principal.is_admin {
            let menus = self.repo.list_menus().await?;
            return Ok(admin_grants(menus));
        }

        let grants = self
            .repo
            .grants_for(principal.id, principal.company_id)
            .await?;
        Ok(merge_grants(grants))
    }

    pub async fn allows(
        &self,
        principal: &Principal,
        menu_url: &str,
        capability: Capability,
    ) -> Result<bool, AppError> {
        if principal.is_admin {
            return Ok(true);
        }

        let grants = self.resolve(principal).await?;
        Ok(grants_allow(&grants, menu_url, capability))
    }

    pub async fn list_menus(&self) -> Result<Vec<Menu>, AppError> {
        self.repo.list_menus().await
    }

    pub async fn find_menu(&self, id: i32) -> Result<Menu, AppError> {
        self.repo.find_menu(id).await?.ok_or(AppError::NotFound("Menu"))
    }
}

/// Algum menu com essa url tem o bit ligado.
pub fn grants_allow(grants: &[MenuGrant], menu_url: &str, capability: Capability) -> bool {
    grants.iter().any(|grant| {
        grant.menu.url.as_deref() == Some(menu_url) && grant.capabilities.allows(capability)
    })
}

fn sort_grants(grants: &mut [MenuGrant]) {
    grants.sort_by_key(|grant| (grant.menu.sequence_no, grant.menu.id));
}

/// Administrador: todos os menus com os cinco bits ligados.
pub fn admin_grants(menus: Vec<Menu>) -> Vec<MenuGrant> {
    let mut grants: Vec<MenuGrant> = menus
        .into_iter()
        .map(|menu| MenuGrant { menu, capabilities: Capabilities::ALL })
        .collect();
    sort_grants(&mut grants);
    grants
}

/// Um menu por id, com OU lógico de todas as concessões que chegam nele.
pub fn merge_grants(grants: Vec<MenuGrant>) -> Vec<MenuGrant> {
    let mut by_menu: BTreeMap<i32, MenuGrant> = BTreeMap::new();
    for grant in grants {
        by_menu
            .entry(grant.menu.id)
            .and_modify(|merged| merged.capabilities = merged.capabilities.union(grant.capabilities))
            .or_insert(grant);
    }

    let mut merged: Vec<MenuGrant> = by_menu.into_values().collect();
    sort_grants(&mut merged);
    merged
}
