use crate::entities::{
    StatutReglement, TypePaiement, assistance_entity as assistance,
    cotisation_mensuelle_entity as cotisation, dette_initiale_entity as dette,
    obligation_entity as obligation,
};
use crate::error::AppResult;
use crate::models::OutstandingItem;
use chrono::Utc;
use sea_orm::sea_query::{Alias, Expr, Func};
use sea_orm::{ActiveEnum, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

/// Amounts of an item after a payment lands on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub montant_paye: i64,
    pub montant_restant: i64,
    pub statut: StatutReglement,
}

/// Columns every payable table carries.
struct Ledger<Col> {
    id: Col,
    paye: Col,
    restant: Col,
    statut: Col,
    updated_at: Col,
}

/// Adds `amount` to what was paid in a single UPDATE, so two payments landing
/// at once on the same row both count. Every right-hand side reads the old
/// row: `restant <= amount` is "nothing left after this payment".
async fn book<E, C>(db: &C, ledger: Ledger<E::Column>, item_id: i64, amount: i64) -> AppResult<bool>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let Ledger {
        id,
        paye,
        restant,
        statut,
        updated_at,
    } = ledger;
    let result = E::update_many()
        .col_expr(paye, Expr::col(paye).add(amount))
        .col_expr(
            restant,
            Func::cust(Alias::new("GREATEST"))
                .arg(Expr::col(restant).sub(amount))
                .arg(0i64)
                .into(),
        )
        .col_expr(
            statut,
            Expr::case(
                Expr::col(restant).lte(amount),
                StatutReglement::Paye.as_enum(),
            )
            .case(
                Expr::expr(Expr::col(paye).add(amount)).gt(0i64),
                StatutReglement::PartiellementPaye.as_enum(),
            )
            .finally(StatutReglement::EnAttente.as_enum())
            .into(),
        )
        .col_expr(updated_at, Expr::value(Utc::now()))
        .filter(id.eq(item_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// One row of the four payable tables.
#[derive(Debug, Clone, PartialEq)]
pub enum DuesItem {
    Cotisation(cotisation::Model),
    Assistance(assistance::Model),
    Dette(dette::Model),
    Obligation(obligation::Model),
}

impl DuesItem {
    pub fn id(&self) -> i64 {
        match self {
            DuesItem::Cotisation(m) => m.id,
            DuesItem::Assistance(m) => m.id,
            DuesItem::Dette(m) => m.id,
            DuesItem::Obligation(m) => m.id,
        }
    }

    pub fn adherent_id(&self) -> i64 {
        match self {
            DuesItem::Cotisation(m) => m.adherent_id,
            DuesItem::Assistance(m) => m.adherent_id,
            DuesItem::Dette(m) => m.adherent_id,
            DuesItem::Obligation(m) => m.adherent_id,
        }
    }

    pub fn type_paiement(&self) -> TypePaiement {
        match self {
            DuesItem::Cotisation(_) => TypePaiement::CotisationMensuelle,
            DuesItem::Assistance(_) => TypePaiement::Assistance,
            DuesItem::Dette(_) => TypePaiement::DetteInitiale,
            DuesItem::Obligation(_) => TypePaiement::Obligation,
        }
    }

    /// Label shown to the payer and sent to the provider.
    pub fn description(&self) -> String {
        match self {
            DuesItem::Cotisation(m) => format!("Cotisation {} - {}", m.type_cotisation, m.periode),
            DuesItem::Assistance(m) => format!(
                "Assistance {} - {}",
                m.type_assistance,
                m.date_evenement.format("%d/%m/%Y")
            ),
            DuesItem::Dette(m) => format!("Dette initiale {}", m.annee),
            DuesItem::Obligation(m) => {
                format!("Obligation {} - {}", m.type_obligation, m.periode)
            }
        }
    }

    fn amounts(&self) -> (i64, i64, i64, StatutReglement) {
        match self {
            DuesItem::Cotisation(m) => (m.montant, m.montant_paye, m.montant_restant, m.statut),
            DuesItem::Assistance(m) => (m.montant, m.montant_paye, m.montant_restant, m.statut),
            DuesItem::Dette(m) => (m.montant, m.montant_paye, m.montant_restant, m.statut),
            DuesItem::Obligation(m) => (m.montant, m.montant_paye, m.montant_restant, m.statut),
        }
    }

    pub fn to_outstanding(&self) -> OutstandingItem {
        let (montant, _, montant_restant, statut) = self.amounts();
        OutstandingItem {
            type_paiement: self.type_paiement(),
            item_id: self.id(),
            description: self.description(),
            montant,
            montant_restant,
            statut,
        }
    }

    pub async fn load<C: ConnectionTrait>(
        db: &C,
        type_paiement: TypePaiement,
        item_id: i64,
    ) -> AppResult<Option<DuesItem>> {
        let item = match type_paiement {
            TypePaiement::CotisationMensuelle => cotisation::Entity::find_by_id(item_id)
                .one(db)
                .await?
                .map(DuesItem::Cotisation),
            TypePaiement::Assistance => assistance::Entity::find_by_id(item_id)
                .one(db)
                .await?
                .map(DuesItem::Assistance),
            TypePaiement::DetteInitiale => dette::Entity::find_by_id(item_id)
                .one(db)
                .await?
                .map(DuesItem::Dette),
            TypePaiement::Obligation => obligation::Entity::find_by_id(item_id)
                .one(db)
                .await?
                .map(DuesItem::Obligation),
            TypePaiement::Adhesion | TypePaiement::General => None,
        };
        Ok(item)
    }

    /// Every item of the adherent with something left to pay.
    pub async fn outstanding_for<C: ConnectionTrait>(
        db: &C,
        adherent_id: i64,
    ) -> AppResult<Vec<DuesItem>> {
        let mut items: Vec<DuesItem> = Vec::new();

        items.extend(
            cotisation::Entity::find()
                .filter(cotisation::Column::AdherentId.eq(adherent_id))
                .filter(cotisation::Column::Statut.ne(StatutReglement::Paye))
                .order_by_asc(cotisation::Column::Periode)
                .all(db)
                .await?
                .into_iter()
                .map(DuesItem::Cotisation),
        );
        items.extend(
            assistance::Entity::find()
                .filter(assistance::Column::AdherentId.eq(adherent_id))
                .filter(assistance::Column::Statut.ne(StatutReglement::Paye))
                .order_by_asc(assistance::Column::DateEvenement)
                .all(db)
                .await?
                .into_iter()
                .map(DuesItem::Assistance),
        );
        items.extend(
            dette::Entity::find()
                .filter(dette::Column::AdherentId.eq(adherent_id))
                .filter(dette::Column::Statut.ne(StatutReglement::Paye))
                .order_by_asc(dette::Column::Annee)
                .all(db)
                .await?
                .into_iter()
                .map(DuesItem::Dette),
        );
        items.extend(
            obligation::Entity::find()
                .filter(obligation::Column::AdherentId.eq(adherent_id))
                .filter(obligation::Column::Statut.ne(StatutReglement::Paye))
                .order_by_asc(obligation::Column::Periode)
                .all(db)
                .await?
                .into_iter()
                .map(DuesItem::Obligation),
        );

        Ok(items)
    }

    pub fn settlement(&self) -> Settlement {
        let (_, montant_paye, montant_restant, statut) = self.amounts();
        Settlement {
            montant_paye,
            montant_restant,
            statut,
        }
    }

    /// Book `amount` cents against an item and return its amounts afterwards.
    /// `None` when the item does not exist.
    pub async fn apply_payment<C: ConnectionTrait>(
        db: &C,
        type_paiement: TypePaiement,
        item_id: i64,
        amount: i64,
    ) -> AppResult<Option<Settlement>> {
        use assistance::Column as A;
        use cotisation::Column as Co;
        use dette::Column as D;
        use obligation::Column as O;

        let booked = match type_paiement {
            TypePaiement::CotisationMensuelle => {
                let ledger = Ledger {
                    id: Co::Id,
                    paye: Co::MontantPaye,
                    restant: Co::MontantRestant,
                    statut: Co::Statut,
                    updated_at: Co::UpdatedAt,
                };
                book::<cotisation::Entity, _>(db, ledger, item_id, amount).await?
            }
            TypePaiement::Assistance => {
                let ledger = Ledger {
                    id: A::Id,
                    paye: A::MontantPaye,
                    restant: A::MontantRestant,
                    statut: A::Statut,
                    updated_at: A::UpdatedAt,
                };
                book::<assistance::Entity, _>(db, ledger, item_id, amount).await?
            }
            TypePaiement::DetteInitiale => {
                let ledger = Ledger {
                    id: D::Id,
                    paye: D::MontantPaye,
                    restant: D::MontantRestant,
                    statut: D::Statut,
                    updated_at: D::UpdatedAt,
                };
                book::<dette::Entity, _>(db, ledger, item_id, amount).await?
            }
            TypePaiement::Obligation => {
                let ledger = Ledger {
                    id: O::Id,
                    paye: O::MontantPaye,
                    restant: O::MontantRestant,
                    statut: O::Statut,
                    updated_at: O::UpdatedAt,
                };
                book::<obligation::Entity, _>(db, ledger, item_id, amount).await?
            }
            TypePaiement::Adhesion | TypePaiement::General => false,
        };
        if !booked {
            return Ok(None);
        }

        let item = Self::load(db, type_paiement, item_id).await?;
        Ok(item.map(|i| i.settlement()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn dette_model(montant_paye: i64, montant_restant: i64, statut: StatutReglement) -> dette::Model {
        dette::Model {
            id: 3,
            adherent_id: 7,
            annee: 2023,
            montant: 12000,
            montant_paye,
            montant_restant,
            statut,
            created_at: None,
            updated_at: None,
        }
    }

    #[actix_web::test]
    async fn test_apply_payment_is_a_single_atomic_update() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![dette_model(
                5000,
                7000,
                StatutReglement::PartiellementPaye,
            )]])
            .into_connection();

        let settlement = DuesItem::apply_payment(&db, TypePaiement::DetteInitiale, 3, 3000)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settlement.montant_paye, 5000);
        assert_eq!(settlement.montant_restant, 7000);
        assert_eq!(settlement.statut, StatutReglement::PartiellementPaye);

        let log = db.into_transaction_log();
        // increment computed by the database, no prior read of the row
        assert_eq!(log.len(), 2);
        let update = format!("{:?}", log[0]);
        assert!(update.contains("UPDATE \\\"dettes_initiales\\\""));
        assert!(update.contains("\\\"montant_paye\\\" + $"));
        assert!(update.contains("GREATEST"));
        assert!(update.contains("CASE WHEN"));
        assert!(update.contains("statut_reglement"));
        assert!(update.contains("BigInt(Some(3000))"));
    }

    #[actix_web::test]
    async fn test_apply_payment_to_missing_item() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let settlement = DuesItem::apply_payment(&db, TypePaiement::Obligation, 99, 1000)
            .await
            .unwrap();
        assert_eq!(settlement, None);
    }

    #[actix_web::test]
    async fn test_apply_payment_to_untracked_type_touches_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let settlement = DuesItem::apply_payment(&db, TypePaiement::General, 1, 1000)
            .await
            .unwrap();
        assert_eq!(settlement, None);
        assert!(db.into_transaction_log().is_empty());
    }

    #[test]
    fn test_descriptions() {
        let assistance = DuesItem::Assistance(assistance::Model {
            id: 2,
            adherent_id: 7,
            type_assistance: "Décès".to_string(),
            date_evenement: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            montant: 5000,
            montant_paye: 0,
            montant_restant: 5000,
            statut: StatutReglement::EnAttente,
            created_at: None,
            updated_at: None,
        });
        assert_eq!(assistance.description(), "Assistance Décès - 03/02/2025");
        assert_eq!(assistance.type_paiement(), TypePaiement::Assistance);

        let dette = DuesItem::Dette(dette_model(2000, 10000, StatutReglement::PartiellementPaye));
        assert_eq!(dette.description(), "Dette initiale 2023");
        let outstanding = dette.to_outstanding();
        assert_eq!(outstanding.montant_restant, 10000);
        assert_eq!(outstanding.item_id, 3);
    }

    #[test]
    fn test_cotisation_and_obligation_descriptions() {
        let cotisation = DuesItem::Cotisation(cotisation::Model {
            id: 1,
            adherent_id: 7,
            periode: "2025-03".to_string(),
            type_cotisation: "mensuelle".to_string(),
            montant: 2500,
            montant_paye: 0,
            montant_restant: 2500,
            statut: StatutReglement::EnAttente,
            created_at: None,
            updated_at: None,
        });
        assert_eq!(cotisation.description(), "Cotisation mensuelle - 2025-03");

        let obligation = DuesItem::Obligation(obligation::Model {
            id: 4,
            adherent_id: 7,
            type_obligation: "Fonds de solidarité".to_string(),
            periode: "2025".to_string(),
            date_echeance: None,
            montant: 10000,
            montant_paye: 0,
            montant_restant: 10000,
            statut: StatutReglement::EnAttente,
            created_at: None,
            updated_at: None,
        });
        assert_eq!(obligation.description(), "Obligation Fonds de solidarité - 2025");
    }
}
