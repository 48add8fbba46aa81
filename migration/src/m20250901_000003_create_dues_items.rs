use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum CotisationsMensuelles {
    Table,
    Id,
    AdherentId,
    Periode,
    TypeCotisation,
}

#[derive(DeriveIden)]
enum Assistances {
    Table,
    Id,
    AdherentId,
    TypeAssistance,
    DateEvenement,
}

#[derive(DeriveIden)]
enum DettesInitiales {
    Table,
    Id,
    AdherentId,
    Annee,
}

#[derive(DeriveIden)]
enum ObligationsCotisations {
    Table,
    Id,
    AdherentId,
    TypeObligation,
    Periode,
    DateEcheance,
}

/// Columns shared by every payable item.
#[derive(DeriveIden)]
enum Reglement {
    Montant,
    MontantPaye,
    MontantRestant,
    Statut,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Adherents {
    Table,
    Id,
}

fn id_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn settlement_columns(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
    table
        .col(ColumnDef::new(Reglement::Montant).big_integer().not_null())
        .col(
            ColumnDef::new(Reglement::MontantPaye)
                .big_integer()
                .not_null()
                .default(0),
        )
        .col(ColumnDef::new(Reglement::MontantRestant).big_integer().not_null())
        .col(
            ColumnDef::new(Reglement::Statut)
                .custom(Alias::new("statut_reglement"))
                .not_null()
                .default(Expr::cust("'EnAttente'::statut_reglement")),
        )
        .col(
            ColumnDef::new(Reglement::CreatedAt)
                .timestamp_with_time_zone()
                .default(Expr::cust("NOW()"))
                .null(),
        )
        .col(
            ColumnDef::new(Reglement::UpdatedAt)
                .timestamp_with_time_zone()
                .default(Expr::cust("NOW()"))
                .null(),
        )
}

fn adherent_fk<T: IntoTableRef, C: IntoIden>(
    table: T,
    col: C,
    name: &str,
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(table, col)
        .to(Adherents::Table, Adherents::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("statut_reglement"))
                    .values(vec![
                        Alias::new("EnAttente"),
                        Alias::new("PartiellementPaye"),
                        Alias::new("Paye"),
                    ])
                    .to_owned(),
            )
            .await?;

        let mut cotisations = Table::create();
        cotisations
            .table(CotisationsMensuelles::Table)
            .if_not_exists()
            .col(&mut id_column(CotisationsMensuelles::Id))
            .col(
                ColumnDef::new(CotisationsMensuelles::AdherentId)
                    .big_integer()
                    .not_null(),
            )
            .col(
                ColumnDef::new(CotisationsMensuelles::Periode)
                    .string_len(7)
                    .not_null(),
            )
            .col(
                ColumnDef::new(CotisationsMensuelles::TypeCotisation)
                    .string_len(255)
                    .not_null(),
            )
            .foreign_key(&mut adherent_fk(
                CotisationsMensuelles::Table,
                CotisationsMensuelles::AdherentId,
                "fk_cotisations_mensuelles_adherent",
            ));
        manager
            .create_table(settlement_columns(&mut cotisations).to_owned())
            .await?;

        let mut assistances = Table::create();
        assistances
            .table(Assistances::Table)
            .if_not_exists()
            .col(&mut id_column(Assistances::Id))
            .col(ColumnDef::new(Assistances::AdherentId).big_integer().not_null())
            .col(
                ColumnDef::new(Assistances::TypeAssistance)
                    .string_len(255)
                    .not_null(),
            )
            .col(ColumnDef::new(Assistances::DateEvenement).date().not_null())
            .foreign_key(&mut adherent_fk(
                Assistances::Table,
                Assistances::AdherentId,
                "fk_assistances_adherent",
            ));
        manager
            .create_table(settlement_columns(&mut assistances).to_owned())
            .await?;

        let mut dettes = Table::create();
        dettes
            .table(DettesInitiales::Table)
            .if_not_exists()
            .col(&mut id_column(DettesInitiales::Id))
            .col(
                ColumnDef::new(DettesInitiales::AdherentId)
                    .big_integer()
                    .not_null(),
            )
            .col(ColumnDef::new(DettesInitiales::Annee).integer().not_null())
            .foreign_key(&mut adherent_fk(
                DettesInitiales::Table,
                DettesInitiales::AdherentId,
                "fk_dettes_initiales_adherent",
            ));
        manager
            .create_table(settlement_columns(&mut dettes).to_owned())
            .await?;

        let mut obligations = Table::create();
        obligations
            .table(ObligationsCotisations::Table)
            .if_not_exists()
            .col(&mut id_column(ObligationsCotisations::Id))
            .col(
                ColumnDef::new(ObligationsCotisations::AdherentId)
                    .big_integer()
                    .not_null(),
            )
            .col(
                ColumnDef::new(ObligationsCotisations::TypeObligation)
                    .string_len(255)
                    .not_null(),
            )
            .col(
                ColumnDef::new(ObligationsCotisations::Periode)
                    .string_len(32)
                    .not_null(),
            )
            .col(
                ColumnDef::new(ObligationsCotisations::DateEcheance)
                    .date()
                    .null(),
            )
            .foreign_key(&mut adherent_fk(
                ObligationsCotisations::Table,
                ObligationsCotisations::AdherentId,
                "fk_obligations_cotisations_adherent",
            ));
        manager
            .create_table(settlement_columns(&mut obligations).to_owned())
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(ObligationsCotisations::Table)
                    .table(DettesInitiales::Table)
                    .table(Assistances::Table)
                    .table(CotisationsMensuelles::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("statut_reglement")).to_owned())
            .await?;
        Ok(())
    }
}
