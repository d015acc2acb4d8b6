//! Member command handlers

use super::AppContext;
use crate::backend::UploadFile;
use crate::cli::{MemberCommand, MemberFieldArgs};
use crate::error::{MedlifeError, Result};
use crate::members::{Member, MemberFields, MemberKey, MemberRegistry};

use colored::Colorize;
use prettytable::{format, row, Table};
use std::path::Path;

/// Handle member commands
pub async fn handle_members(ctx: &AppContext, command: MemberCommand) -> Result<()> {
    let email = ctx.require_email()?;
    let registry = ctx.members(&email);

    match command {
        MemberCommand::List { json } => {
            let members = registry.list().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&members)?);
            } else {
                print_members(&members, registry.max_members());
            }
        }
        MemberCommand::Show { index } => {
            let member = registry.details(index).await?;
            print_member(&member);
        }
        MemberCommand::Add { fields } => {
            // The member cap is checked against the cached list
            registry.list().await;
            let mut form = apply_args(MemberFields::default(), &fields);
            attach_prescription(&registry, &mut form, fields.prescription.as_deref()).await?;
            let members = registry.add(&form).await?;
            println!(
                "{}",
                format!("Added {} {}", form.first_name.trim(), form.last_name.trim()).green()
            );
            print_members(&members, registry.max_members());
        }
        MemberCommand::Edit { index, fields } => {
            let current = known_member(&registry, index).await?;
            let mut form = apply_args(current.fields(), &fields);
            attach_prescription(&registry, &mut form, fields.prescription.as_deref()).await?;
            let members = registry.edit(&current.key(), &form).await?;
            println!("{}", format!("Updated {}", current.full_name()).green());
            print_members(&members, registry.max_members());
        }
        MemberCommand::Delete { index } => {
            let current = known_member(&registry, index).await?;
            let members = registry.delete(&current.key()).await?;
            println!("{}", format!("Deleted {}", current.full_name()).green());
            print_members(&members, registry.max_members());
        }
        MemberCommand::Ocr { file } => {
            let result = registry.extract_prescription(UploadFile::from_path(&file)?).await?;
            if result.medicines.is_empty() {
                println!("{}", "No medicines found.".yellow());
            } else {
                println!("{} {}", "Medicines:".bold(), result.medicines_line());
            }
            if !result.full_text.trim().is_empty() {
                println!("\n{}\n{}", "Full text:".bold(), result.full_text.trim());
            }
        }
    }

    Ok(())
}

/// Member `index` as the user last saw it
///
/// Uses the cached list so the key reflects what was displayed; the
/// registry re-fetches and re-resolves it before mutating.
async fn known_member(registry: &MemberRegistry, index: u32) -> Result<Member> {
    let mut members = registry.cached();
    if members.is_empty() {
        members = registry.fetch_fresh().await?;
    }
    members
        .into_iter()
        .find(|m| m.member_index == index)
        .ok_or_else(|| {
            MedlifeError::StaleMember(
                MemberKey {
                    index,
                    first_name: String::new(),
                    last_name: String::new(),
                }
                .to_string(),
            )
            .into()
        })
}

async fn attach_prescription(
    registry: &MemberRegistry,
    form: &mut MemberFields,
    file: Option<&Path>,
) -> Result<()> {
    if let Some(file) = file {
        let result = registry.extract_prescription(UploadFile::from_path(file)?).await?;
        println!("Found medicines: {}", result.medicines_line().cyan());
        form.append_medicines(&result);
    }
    Ok(())
}

/// Overlay the given command-line fields on `base`
pub fn apply_args(mut base: MemberFields, args: &MemberFieldArgs) -> MemberFields {
    let pairs: [(&mut String, &Option<String>); 12] = [
        (&mut base.first_name, &args.first_name),
        (&mut base.last_name, &args.last_name),
        (&mut base.dob, &args.dob),
        (&mut base.race, &args.race),
        (&mut base.gender, &args.gender),
        (&mut base.height, &args.height),
        (&mut base.weight, &args.weight),
        (&mut base.a1c, &args.a1c),
        (&mut base.blood_pressure, &args.blood_pressure),
        (&mut base.medicine, &args.medicine),
        (&mut base.bmi, &args.bmi),
        (&mut base.zip_code, &args.zip_code),
    ];
    for (field, value) in pairs {
        if let Some(value) = value {
            *field = value.clone();
        }
    }
    base
}

fn print_members(members: &[Member], max_members: usize) {
    if members.is_empty() {
        println!("{}", "No members yet.".yellow());
        println!("Use {} to add one.", "medlife members add --first-name <F> --last-name <L>".cyan());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "#".bold(),
        "Name".bold(),
        "DOB".bold(),
        "Gender".bold(),
        "A1C".bold(),
        "Blood Pressure".bold()
    ]);
    for member in members {
        table.add_row(row![
            member.member_index.to_string().cyan(),
            member.full_name(),
            member.dob,
            member.gender,
            member.a1c,
            member.blood_pressure
        ]);
    }

    println!("\nFamily Members ({}/{}):", members.len(), max_members);
    table.printstd();
    println!();
}

fn print_member(member: &Member) {
    let rows = [
        ("Name", member.full_name()),
        ("Date of birth", member.dob.clone()),
        ("Race", member.race.clone()),
        ("Gender", member.gender.clone()),
        ("Height", member.height.clone()),
        ("Weight", member.weight.clone()),
        ("BMI", member.bmi.clone()),
        ("A1C", member.a1c.clone()),
        ("Blood pressure", member.blood_pressure.clone()),
        ("Medicine", member.medicine.clone()),
        ("Zip code", member.zip_code.clone()),
    ];

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    for (label, value) in rows {
        let value = if value.is_empty() { "-".to_string() } else { value };
        table.add_row(row![label.bold(), value]);
    }
    println!("\nMember #{}", member.member_index);
    table.printstd();
    println!();
}
