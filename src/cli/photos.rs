//! List and status commands.

use color_eyre::Result;

use crate::api::LightboxClient;
use crate::models::{Photo, PhotoState};

/// Handle the `list` command.
///
/// Prints a table of photos, optionally filtered by state.
pub async fn handle_list_command(
    client: &LightboxClient,
    state: Option<PhotoState>,
) -> Result<()> {
    let photos = client.list_photos().await?;
    let filtered: Vec<&Photo> = photos
        .iter()
        .filter(|p| state.map_or(true, |s| p.state == s))
        .collect();

    if filtered.is_empty() {
        match state {
            Some(state) => println!("No photos in state {}.", state),
            None => println!("No photos found."),
        }
        return Ok(());
    }

    println!("{:<16} {:<12} {:<32} CAPTION", "ID", "STATE", "FILE");
    for photo in &filtered {
        println!("{}", format_photo_row(photo));
    }
    println!();
    match filtered.len() {
        1 => println!("1 photo"),
        n => println!("{} photos", n),
    }
    Ok(())
}

/// Handle the `status` command.
///
/// Prints the full record for one photo.
pub async fn handle_status_command(client: &LightboxClient, photo_id: &str) -> Result<()> {
    let photo = client.get_photo(photo_id).await?;

    println!("ID:        {}", photo.id);
    println!("File:      {}", photo.file_name);
    println!("State:     {}", photo.state);
    if let Some(ref caption) = photo.caption {
        println!("Caption:   {}", caption);
    }
    if let Some(ref description) = photo.description {
        println!("About:     {}", description);
    }
    if !photo.keywords.is_empty() {
        println!("Keywords:  {}", photo.keywords.join(", "));
    }
    if let Some(ref sha) = photo.content_sha256 {
        println!("SHA-256:   {}", sha);
    }
    println!("Created:   {}", photo.created_at.to_rfc3339());
    if let Some(updated_at) = photo.updated_at {
        println!("Updated:   {}", updated_at.to_rfc3339());
    }

    if let Some(ref ai) = photo.ai {
        println!();
        println!("AI metadata:");
        if let Some(ref caption) = ai.caption {
            println!("  Caption:     {}", caption);
        }
        if !ai.keywords.is_empty() {
            println!("  Keywords:    {}", ai.keywords.join(", "));
        }
        if let Some(confidence) = ai.confidence {
            println!("  Confidence:  {:.2}", confidence);
        }
        if let Some(ref model) = ai.model_version {
            println!("  Model:       {}", model);
        }
    }
    Ok(())
}

fn format_photo_row(photo: &Photo) -> String {
    format!(
        "{:<16} {:<12} {:<32} {}",
        photo.id,
        photo.state.to_string(),
        photo.file_name,
        photo.caption.as_deref().unwrap_or("-")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, file_name: &str, state: &str) -> Photo {
        serde_json::from_str(&format!(
            r#"{{"id": "{}", "file_name": "{}", "state": "{}"}}"#,
            id, file_name, state
        ))
        .unwrap()
    }

    #[test]
    fn test_format_photo_row_pads_columns() {
        let row = format_photo_row(&photo("p1", "a.jpg", "working"));
        assert!(row.starts_with("p1 "));
        // State column starts after the 16-char id field and a space
        assert_eq!(&row[17..24], "working");
        assert!(row.ends_with('-'));
    }

    #[test]
    fn test_format_photo_row_shows_caption() {
        let mut p = photo("p1", "a.jpg", "finished");
        p.caption = Some("Sunset".to_string());
        assert!(format_photo_row(&p).ends_with("Sunset"));
    }
}
