use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Evenements {
    Table,
    Id,
    Titre,
    Description,
    DateDebut,
    DateFin,
    DateAffichage,
    DateFinAffichage,
    Lieu,
    Categorie,
    Statut,
    Public,
    PlacesDisponibles,
    PlacesReservees,
    InscriptionRequise,
    DateLimiteInscription,
    ImageUrl,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum InscriptionsEvenements {
    Table,
    Id,
    EvenementId,
    AdherentId,
    VisiteurNom,
    VisiteurEmail,
    VisiteurTelephone,
    VisiteurAdresse,
    NombrePersonnes,
    Statut,
    Commentaire,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Adherents {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // enums
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("evenement_categorie"))
                    .values(vec![
                        Alias::new("General"),
                        Alias::new("Formation"),
                        Alias::new("Social"),
                        Alias::new("Sportif"),
                        Alias::new("Culturel"),
                    ])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("evenement_statut"))
                    .values(vec![
                        Alias::new("Brouillon"),
                        Alias::new("Publie"),
                        Alias::new("Archive"),
                    ])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("inscription_statut"))
                    .values(vec![Alias::new("EnAttente"), Alias::new("Confirme")])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Evenements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Evenements::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Evenements::Titre).string_len(255).not_null())
                    .col(ColumnDef::new(Evenements::Description).text().not_null())
                    .col(
                        ColumnDef::new(Evenements::DateDebut)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Evenements::DateFin)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Evenements::DateAffichage)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Evenements::DateFinAffichage)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Evenements::Lieu).string_len(255).null())
                    .col(
                        ColumnDef::new(Evenements::Categorie)
                            .custom(Alias::new("evenement_categorie"))
                            .not_null()
                            .default(Expr::cust("'General'::evenement_categorie")),
                    )
                    .col(
                        ColumnDef::new(Evenements::Statut)
                            .custom(Alias::new("evenement_statut"))
                            .not_null()
                            .default(Expr::cust("'Brouillon'::evenement_statut")),
                    )
                    .col(
                        ColumnDef::new(Evenements::Public)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Evenements::PlacesDisponibles).integer().null())
                    .col(
                        ColumnDef::new(Evenements::PlacesReservees)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Evenements::InscriptionRequise)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Evenements::DateLimiteInscription)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Evenements::ImageUrl).text().null())
                    .col(ColumnDef::new(Evenements::CreatedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Evenements::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Evenements::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_evenements_created_by")
                            .from(Evenements::Table, Evenements::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_evenements_statut_date")
                    .table(Evenements::Table)
                    .col(Evenements::Statut)
                    .col(Evenements::DateDebut)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InscriptionsEvenements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InscriptionsEvenements::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InscriptionsEvenements::EvenementId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InscriptionsEvenements::AdherentId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InscriptionsEvenements::VisiteurNom)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InscriptionsEvenements::VisiteurEmail)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InscriptionsEvenements::VisiteurTelephone)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InscriptionsEvenements::VisiteurAdresse)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InscriptionsEvenements::NombrePersonnes)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(InscriptionsEvenements::Statut)
                            .custom(Alias::new("inscription_statut"))
                            .not_null()
                            .default(Expr::cust("'EnAttente'::inscription_statut")),
                    )
                    .col(
                        ColumnDef::new(InscriptionsEvenements::Commentaire)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InscriptionsEvenements::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(InscriptionsEvenements::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inscriptions_evenement")
                            .from(
                                InscriptionsEvenements::Table,
                                InscriptionsEvenements::EvenementId,
                            )
                            .to(Evenements::Table, Evenements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inscriptions_adherent")
                            .from(
                                InscriptionsEvenements::Table,
                                InscriptionsEvenements::AdherentId,
                            )
                            .to(Adherents::Table, Adherents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_inscriptions_evenement_adherent")
                    .table(InscriptionsEvenements::Table)
                    .col(InscriptionsEvenements::EvenementId)
                    .col(InscriptionsEvenements::AdherentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // one visitor registration per e-mail and event; partial index, not expressible in the builder
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_inscriptions_evenement_visiteur_email \
                 ON inscriptions_evenements (evenement_id, lower(visiteur_email)) \
                 WHERE adherent_id IS NULL",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE inscriptions_evenements ADD CONSTRAINT ck_inscriptions_registrant \
                 CHECK ((adherent_id IS NULL) <> (visiteur_email IS NULL))",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(InscriptionsEvenements::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Evenements::Table).to_owned())
            .await?;
        for name in ["inscription_statut", "evenement_statut", "evenement_categorie"] {
            manager
                .drop_type(Type::drop().name(Alias::new(name)).to_owned())
                .await?;
        }
        Ok(())
    }
}
